// tests/pipeline.rs
use anyhow::Result;
use ciha_summary::{
    config::Config,
    pipeline::{process_directory, ProcessRun},
};
use std::{fs, path::Path};
use tempfile::tempdir;

const FIELDS: &[(&str, usize)] = &[("PROC_REA", 10), ("SEXO", 1), ("IDADE", 3)];

fn dbf(rows: &[[&str; 3]]) -> Vec<u8> {
    let header_len = 32 + FIELDS.len() * 32 + 1;
    let record_len = 1 + FIELDS.iter().map(|(_, l)| l).sum::<usize>();

    let mut out = vec![0u8; 32];
    out[0] = 0x03;
    out[4..8].copy_from_slice(&(rows.len() as u32).to_le_bytes());
    out[8..10].copy_from_slice(&(header_len as u16).to_le_bytes());
    out[10..12].copy_from_slice(&(record_len as u16).to_le_bytes());
    for (name, len) in FIELDS {
        let mut desc = [0u8; 32];
        desc[..name.len()].copy_from_slice(name.as_bytes());
        desc[11] = b'C';
        desc[16] = *len as u8;
        out.extend_from_slice(&desc);
    }
    out.push(0x0d);
    for row in rows {
        out.push(b' ');
        for ((_, len), value) in FIELDS.iter().zip(row) {
            let mut cell = vec![b' '; *len];
            cell[..value.len()].copy_from_slice(value.as_bytes());
            out.extend_from_slice(&cell);
        }
    }
    out.push(0x1a);
    out
}

/// Wrap dBase bytes as a `.dbc`: raw header, CRC, then an implode stream of
/// uncoded literals.
fn dbc(dbf: &[u8]) -> Vec<u8> {
    let header_len = usize::from(u16::from_le_bytes([dbf[8], dbf[9]]));
    let mut bits: Vec<bool> = Vec::new();
    let mut push = |value: u32, count: u32| {
        for i in 0..count {
            bits.push((value >> i) & 1 == 1);
        }
    };
    push(0, 8);
    push(4, 8);
    for &b in &dbf[header_len..] {
        push(0, 1);
        push(u32::from(b), 8);
    }
    push(1, 1);
    push(0, 7);
    push(0xff, 8);

    let mut out = dbf[..header_len].to_vec();
    out.extend_from_slice(&[0, 0, 0, 0]);
    for chunk in bits.chunks(8) {
        out.push(
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &bit)| acc | (u8::from(bit) << i)),
        );
    }
    out
}

fn write(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    fs::write(dir.join(name), bytes)?;
    Ok(())
}

fn run(data_dir: &Path, output_dir: &Path) -> Result<ProcessRun> {
    let config = Config {
        data_dir: data_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        ..Config::default()
    };
    process_directory(&config)
}

#[test]
fn summarises_a_directory_end_to_end() -> Result<()> {
    let data = tempdir()?;
    let out = tempdir()?;

    write(
        data.path(),
        "CIHASP2301.dbc",
        &dbc(&dbf(&[
            ["0204030170", "1", "45"],
            ["0204030170", "1", "47"],
            ["0206010079", "3", "8"],
            ["0301010072", "3", "8"],
        ])),
    )?;
    write(data.path(), "CIHASP2402.dbf", &dbf(&[["0204030170", "1", "41"]]))?;
    write(data.path(), "CIHARJ2301.dbc", &dbc(&dbf(&[["0301010072", "1", "30"]])))?;
    write(data.path(), "CIHAAC2301.dbc", b"")?;
    write(data.path(), "CIHAPR2301.dbc", b"definitely not an archive")?;

    let config = Config {
        data_dir: data.path().to_path_buf(),
        output_dir: out.path().to_path_buf(),
        threads: Some(2),
        ..Config::default()
    };
    let ProcessRun::Completed { outputs, failed } = process_directory(&config)? else {
        panic!("expected a completed run");
    };

    assert_eq!(failed.len(), 1);
    assert!(failed[0].path.ends_with("CIHAPR2301.dbc"));

    let long = fs::read_to_string(&outputs.long_csv)?;
    assert_eq!(
        long,
        "UF_ATENDIMENTO,ANO_ATENDIMENTO,SEXO,FAIXA_ETARIA,PROC_GRU_NOME,REGIAO_CORPORAL_DETALHADA,TOTAL_PROCEDIMENTOS\n\
         SP,2023,Male,40-49,RX,Torax / abdomen / cintura / pelve,2\n\
         SP,2023,Female,5-9,TC,Cabeça e pescoço,1\n\
         SP,2024,Male,40-49,RX,Torax / abdomen / cintura / pelve,1\n"
    );

    assert_eq!(outputs.wide, vec![out.path().join("wide").join("SP.csv")]);
    let wide = fs::read_to_string(&outputs.wide[0])?;
    assert_eq!(
        wide,
        "SEXO,FAIXA_ETARIA,PROC_GRU_NOME,REGIAO_CORPORAL_DETALHADA,TOTAL_2023,TOTAL_2024\n\
         Male,40-49,RX,Torax / abdomen / cintura / pelve,2,1\n\
         Female,5-9,TC,Cabeça e pescoço,1,0\n"
    );

    assert!(fs::metadata(&outputs.long_parquet)?.len() > 0);

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&outputs.report)?)?;
    assert_eq!(report["files_seen"], 5);
    assert_eq!(report["succeeded"], 2);
    assert_eq!(report["empty"], 2);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["procedures"], 4);
    assert_eq!(report["years"], serde_json::json!([2023, 2024]));
    Ok(())
}

#[test]
fn rerunning_produces_identical_outputs() -> Result<()> {
    let data = tempdir()?;
    write(
        data.path(),
        "CIHABA1907.dbc",
        &dbc(&dbf(&[["0205020097", "3", "33"], ["0211020036", "1", "61"]])),
    )?;
    write(data.path(), "CIHAMG2001.dbf", &dbf(&[["0204030170", "0", "x"]]))?;

    let first = tempdir()?;
    let second = tempdir()?;
    run(data.path(), first.path())?;
    run(data.path(), second.path())?;

    for name in ["datasus_sumario_nacional_long.csv", "wide/BA.csv", "wide/MG.csv"] {
        assert_eq!(
            fs::read(first.path().join(name))?,
            fs::read(second.path().join(name))?,
            "{name}"
        );
    }
    Ok(())
}

#[test]
fn nothing_usable_is_reported() -> Result<()> {
    let data = tempdir()?;
    let out = tempdir()?;
    write(data.path(), "CIHASP2301.dbc", b"corrupt bytes here")?;
    write(data.path(), "README.dbf", b"also not a dbf")?;

    let ProcessRun::NoUsableInput { failed } = run(data.path(), out.path())? else {
        panic!("expected no usable input");
    };
    assert_eq!(failed.len(), 2);
    assert!(out.path().join("run_report.json").exists());
    assert!(!out.path().join("datasus_sumario_nacional_long.csv").exists());

    let empty = tempdir()?;
    assert!(matches!(
        run(empty.path(), out.path())?,
        ProcessRun::NoUsableInput { failed } if failed.is_empty()
    ));
    Ok(())
}
