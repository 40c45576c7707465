// src/output/wide.rs
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use super::{COL_AGE, COL_BODY_REGION, COL_CATEGORY, COL_SEX};
use crate::reshape::WideTable;

pub fn header(years: &[u16]) -> Vec<String> {
    [COL_SEX, COL_AGE, COL_CATEGORY, COL_BODY_REGION]
        .iter()
        .map(|c| c.to_string())
        .chain(years.iter().map(|y| format!("TOTAL_{y}")))
        .collect()
}

pub fn write_table(table: &WideTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(header(&table.years))?;
    for (key, counts) in &table.rows {
        let mut record = vec![
            key.sex.to_string(),
            key.age.to_string(),
            key.category.to_string(),
            key.body_region.to_string(),
        ];
        record.extend(counts.iter().map(u64::to_string));
        writer.write_record(&record)?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

/// One `<UF>.csv` per table under `dir`.
pub fn write_all(tables: &[WideTable], dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let mut written = Vec::with_capacity(tables.len());
    for table in tables {
        let path = dir.join(format!("{}.csv", table.region));
        write_table(table, &path)?;
        debug!(region = %table.region, rows = table.rows.len(), "wrote wide table");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregateKey, AggregateRow, LongTable};
    use crate::enrich::{AgeBucket, Sex};
    use crate::reshape::reshape;
    use tempfile::tempdir;

    fn row(region: &str, year: u16, count: u64) -> AggregateRow {
        AggregateRow {
            key: AggregateKey {
                region: region.into(),
                year,
                sex: Sex::Female,
                age: AgeBucket::From60To69,
                category: "TC",
                body_region: "Cabeça e pescoço",
            },
            count,
        }
    }

    #[test]
    fn writes_one_file_per_region_with_year_columns() -> Result<()> {
        let long: LongTable = vec![row("SP", 2021, 5), row("RJ", 2023, 2)]
            .into_iter()
            .collect();
        let dir = tempdir()?;
        let paths = write_all(&reshape(&long), dir.path())?;
        assert_eq!(paths, vec![dir.path().join("RJ.csv"), dir.path().join("SP.csv")]);

        let sp = fs::read_to_string(dir.path().join("SP.csv"))?;
        assert_eq!(
            sp,
            "SEXO,FAIXA_ETARIA,PROC_GRU_NOME,REGIAO_CORPORAL_DETALHADA,TOTAL_2021,TOTAL_2023\n\
             Female,60-69,TC,Cabeça e pescoço,5,0\n"
        );
        Ok(())
    }

    #[test]
    fn rewriting_is_byte_identical() -> Result<()> {
        let long: LongTable = vec![row("BA", 2019, 1), row("BA", 2020, 4)]
            .into_iter()
            .collect();
        let dir = tempdir()?;
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        write_all(&reshape(&long), &first)?;
        write_all(&reshape(&long), &second)?;
        assert_eq!(fs::read(first.join("BA.csv"))?, fs::read(second.join("BA.csv"))?);
        Ok(())
    }
}
