// src/process/mod.rs
use anyhow::{Context, Result};
use glob::{glob_with, MatchOptions, Pattern};
use rayon::prelude::*;
use std::{
    collections::HashMap,
    fs, io,
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::aggregate::{AggregateKey, AggregateRow, LongTable};
use crate::classify::{is_diagnostic, ClassificationTables, Unmapped};
use crate::config::FieldNames;
use crate::decode::{RawTable, RecordDecoder};
use crate::enrich::{Enricher, FileMeta};
use crate::error::ProcessError;

/// Why a file contributed no rows without being a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    ZeroBytes,
    NoRecords,
    NoDiagnosticRecords,
}

#[derive(Debug)]
pub enum FileOutcome {
    Success(Vec<AggregateRow>),
    Empty(EmptyReason),
    Failed(ProcessError),
}

impl FileOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, FileOutcome::Failed(_))
    }
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Read region, year and month from a name like `CIHASP2301.dbc`.
///
/// Region is stem chars `[4,6)`, the two-digit year `[6,8)` and the month
/// `[8,10)`. The stem ends at the first `.`.
pub fn parse_file_meta(path: &Path) -> Result<FileMeta, ProcessError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or_default();
    let bad = || ProcessError::BadFileName(name.clone());

    let region = stem.get(4..6).filter(|r| !r.trim().is_empty()).ok_or_else(bad)?;
    let yy = stem
        .get(6..8)
        .filter(|y| y.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(bad)?;
    let year = 2000 + yy.parse::<u16>().map_err(|_| bad())?;
    let month = stem
        .get(8..10)
        .and_then(|m| m.parse::<u8>().ok())
        .filter(|m| (1..=12).contains(m));

    Ok(FileMeta {
        region: region.to_string(),
        year,
        month,
    })
}

/// Turns one archive into its grouped diagnostic counts.
pub struct FileAggregator<'a> {
    decoder: &'a dyn RecordDecoder,
    fields: &'a FieldNames,
    tables: &'static ClassificationTables,
}

impl<'a> FileAggregator<'a> {
    pub fn new(decoder: &'a dyn RecordDecoder, fields: &'a FieldNames) -> Self {
        Self {
            decoder,
            fields,
            tables: ClassificationTables::global(),
        }
    }

    /// Never returns an error: every fault becomes [`FileOutcome::Failed`].
    #[instrument(level = "info", skip(self, path), fields(file = %path.display()))]
    pub fn process_file(&self, path: &Path) -> FileOutcome {
        let start = Instant::now();
        let outcome = match self.try_process(path) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "file failed");
                FileOutcome::Failed(err)
            }
        };
        match &outcome {
            FileOutcome::Success(rows) => {
                info!(rows = rows.len(), elapsed = ?start.elapsed(), "summarised")
            }
            FileOutcome::Empty(reason) => info!(?reason, "no diagnostic data"),
            FileOutcome::Failed(_) => {}
        }
        outcome
    }

    fn try_process(&self, path: &Path) -> Result<FileOutcome, ProcessError> {
        // 1) existence and size
        let metadata = fs::metadata(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ProcessError::NotFound(path.to_path_buf()),
            _ => ProcessError::Unreadable {
                path: path.to_path_buf(),
                source,
            },
        })?;
        if metadata.len() == 0 {
            return Ok(FileOutcome::Empty(EmptyReason::ZeroBytes));
        }

        // 2) region/year from the name
        let meta = parse_file_meta(path)?;
        if let Some(month) = meta.month {
            debug!(region = %meta.region, year = meta.year, month, "file metadata");
        }

        // 3) decode, isolating panics to this file
        let decoded = panic::catch_unwind(AssertUnwindSafe(|| self.decoder.decode(path)))
            .map_err(|payload| ProcessError::DecodePanic {
                path: path.to_path_buf(),
                message: panic_message(payload.as_ref()),
            })?;
        let table = decoded.map_err(|source| ProcessError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        // 4) filter, enrich, count
        self.summarise(&meta, &table)
    }

    /// Count the diagnostic records of an already decoded table.
    pub fn summarise(&self, meta: &FileMeta, table: &RawTable) -> Result<FileOutcome, ProcessError> {
        if table.is_empty() {
            return Ok(FileOutcome::Empty(EmptyReason::NoRecords));
        }
        let enricher = Enricher::for_table(self.tables, self.fields, table)?;

        let mut counts = LongTable::new();
        let mut unmapped: HashMap<Unmapped, usize> = HashMap::new();
        let mut skipped = 0usize;

        for record in table.records() {
            if !is_diagnostic(enricher.procedure_code(&record)) {
                skipped += 1;
                continue;
            }
            let enriched = enricher.enrich(record, meta);
            if let Some(level) = enriched.class.unmapped {
                trace!(code = enriched.procedure_code, ?level, "unmapped procedure code");
                *unmapped.entry(level).or_insert(0) += 1;
            }
            counts.increment(AggregateKey::from(&enriched));
        }

        debug!(records = table.len(), skipped, "filtered to diagnostic group");
        if !unmapped.is_empty() {
            debug!(?unmapped, "records classified with fallback labels");
        }

        if counts.is_empty() {
            return Ok(FileOutcome::Empty(EmptyReason::NoDiagnosticRecords));
        }
        Ok(FileOutcome::Success(counts.into_rows()))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into())
}

/// Every `*.dbc` / `*.dbf` file directly under `dir`, any case, sorted.
pub fn discover_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let base = Pattern::escape(&dir.to_string_lossy());

    let mut found = Vec::new();
    for ext in ["dbc", "dbf"] {
        let pattern = format!("{base}/*.{ext}");
        for entry in glob_with(&pattern, options).with_context(|| format!("bad pattern {pattern}"))? {
            match entry {
                Ok(path) if path.is_file() => found.push(path),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "skipping unreadable entry"),
            }
        }
    }
    found.sort();
    found.dedup();
    Ok(found)
}

/// Process files in parallel; one report per input path, in input order.
pub fn process_all(
    paths: &[PathBuf],
    aggregator: &FileAggregator<'_>,
    threads: Option<usize>,
) -> Result<Vec<FileReport>> {
    let run = || {
        paths
            .par_iter()
            .map(|path| FileReport {
                path: path.clone(),
                outcome: aggregator.process_file(path),
            })
            .collect::<Vec<_>>()
    };

    let start = Instant::now();
    let reports = match threads {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .context("building file-processing pool")?
            .install(run),
        None => run(),
    };
    let failed = reports.iter().filter(|r| r.outcome.is_failed()).count();
    info!(files = reports.len(), failed, elapsed = ?start.elapsed(), "processed archives");
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{dbc::tests::build_dbc, dbf::tests::build_dbf, ArchiveDecoder};
    use crate::enrich::{AgeBucket, Sex};
    use crate::error::DecodeError;
    use tempfile::tempdir;

    const FIELDS: &[(&str, usize)] = &[("PROC_REA", 10), ("SEXO", 1), ("IDADE", 3)];

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("ciha_summary=debug")
            .with_test_writer()
            .try_init();
    }

    fn run(path: &Path) -> FileOutcome {
        let decoder = ArchiveDecoder::default();
        let fields = FieldNames::default();
        FileAggregator::new(&decoder, &fields).process_file(path)
    }

    #[test]
    fn file_name_metadata() {
        let meta = parse_file_meta(Path::new("/data/CIHASP2301.dbc")).unwrap();
        assert_eq!(meta.region, "SP");
        assert_eq!(meta.year, 2023);
        assert_eq!(meta.month, Some(1));

        let meta = parse_file_meta(Path::new("CIHARJ11.tar.dbc")).unwrap();
        assert_eq!((meta.region.as_str(), meta.year, meta.month), ("RJ", 2011, None));

        for bad in ["CIHA.dbc", "CIHASP2.dbc", "CIHASPxx01.dbc", ""] {
            assert!(
                matches!(parse_file_meta(Path::new(bad)), Err(ProcessError::BadFileName(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn chest_radiograph_scenario() -> anyhow::Result<()> {
        init_tracing();
        let dir = tempdir()?;
        let path = dir.path().join("CIHASP2301.dbc");
        fs::write(
            &path,
            build_dbc(&build_dbf(FIELDS, &[(false, vec!["0204030170", "1", "45"])])),
        )?;

        let FileOutcome::Success(rows) = run(&path) else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.key.region, "SP");
        assert_eq!(row.key.year, 2023);
        assert_eq!(row.key.sex, Sex::Male);
        assert_eq!(row.key.age, AgeBucket::From40To49);
        assert_eq!(row.key.category, "RX");
        assert_eq!(row.key.body_region, "Torax / abdomen / cintura / pelve");
        assert_eq!(row.count, 1);
        Ok(())
    }

    #[test]
    fn groups_and_counts_diagnostic_rows_only() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("CIHAMG1905.dbf");
        fs::write(
            &path,
            build_dbf(
                FIELDS,
                &[
                    (false, vec!["0206010079", "3", "70"]),
                    (false, vec!["0206010079", "3", "75"]),
                    (false, vec!["0206010079", "1", "75"]),
                    (false, vec!["0301010072", "3", "70"]),
                    (true, vec!["0206010079", "3", "70"]),
                ],
            ),
        )?;

        let FileOutcome::Success(rows) = run(&path) else {
            panic!("expected rows");
        };
        let counts: Vec<_> = rows.iter().map(|r| (r.key.sex, r.count)).collect();
        assert_eq!(counts, vec![(Sex::Male, 1), (Sex::Female, 2)]);
        assert!(rows.iter().all(|r| r.key.category == "TC" && r.key.year == 2019));
        Ok(())
    }

    #[test]
    fn non_diagnostic_file_is_empty() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("CIHABA2002.dbc");
        fs::write(
            &path,
            build_dbc(&build_dbf(FIELDS, &[(false, vec!["0301010072", "1", "30"])])),
        )?;
        assert!(matches!(
            run(&path),
            FileOutcome::Empty(EmptyReason::NoDiagnosticRecords)
        ));
        Ok(())
    }

    #[test]
    fn zero_byte_and_recordless_files_are_empty() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let zero = dir.path().join("CIHAAC2301.dbc");
        fs::write(&zero, b"")?;
        assert!(matches!(run(&zero), FileOutcome::Empty(EmptyReason::ZeroBytes)));

        let header_only = dir.path().join("CIHAAC2302.dbf");
        fs::write(&header_only, build_dbf(FIELDS, &[]))?;
        assert!(matches!(
            run(&header_only),
            FileOutcome::Empty(EmptyReason::NoRecords)
        ));
        Ok(())
    }

    #[test]
    fn failures_are_discriminated() -> anyhow::Result<()> {
        init_tracing();
        let dir = tempdir()?;

        let missing = dir.path().join("CIHASP2301.dbc");
        assert!(matches!(
            run(&missing),
            FileOutcome::Failed(ProcessError::NotFound(_))
        ));

        let badly_named = dir.path().join("x.dbc");
        fs::write(&badly_named, b"not empty")?;
        assert!(matches!(
            run(&badly_named),
            FileOutcome::Failed(ProcessError::BadFileName(_))
        ));

        let corrupt = dir.path().join("CIHASP2302.dbc");
        fs::write(&corrupt, b"garbage that is not a dbc")?;
        assert!(matches!(
            run(&corrupt),
            FileOutcome::Failed(ProcessError::Decode { .. })
        ));

        let no_procedure = dir.path().join("CIHASP2303.dbf");
        fs::write(
            &no_procedure,
            build_dbf(&[("SEXO", 1)], &[(false, vec!["1"])]),
        )?;
        assert!(matches!(
            run(&no_procedure),
            FileOutcome::Failed(ProcessError::MissingField(_))
        ));
        Ok(())
    }

    struct PanickingDecoder;

    impl RecordDecoder for PanickingDecoder {
        fn decode(&self, _path: &Path) -> Result<RawTable, DecodeError> {
            panic!("malformed block");
        }
    }

    #[test]
    fn decoder_panic_becomes_a_failure() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("CIHASP2301.dbc");
        fs::write(&path, b"bytes")?;

        let fields = FieldNames::default();
        let outcome = FileAggregator::new(&PanickingDecoder, &fields).process_file(&path);
        match outcome {
            FileOutcome::Failed(ProcessError::DecodePanic { message, .. }) => {
                assert_eq!(message, "malformed block")
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn discovery_and_parallel_processing() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("CIHASP2301.DBC"),
            build_dbc(&build_dbf(FIELDS, &[(false, vec!["0204030170", "1", "45"])])),
        )?;
        fs::write(
            dir.path().join("CIHARJ2301.dbf"),
            build_dbf(FIELDS, &[(false, vec!["0202010120", "3", "8"])]),
        )?;
        fs::write(dir.path().join("CIHAPR2301.dbc"), b"corrupt")?;
        fs::write(dir.path().join("notes.txt"), b"ignored")?;

        let paths = discover_archives(dir.path())?;
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["CIHAPR2301.dbc", "CIHARJ2301.dbf", "CIHASP2301.DBC"]);

        let decoder = ArchiveDecoder::default();
        let fields = FieldNames::default();
        let aggregator = FileAggregator::new(&decoder, &fields);
        let reports = process_all(&paths, &aggregator, Some(2))?;

        assert_eq!(reports.len(), 3);
        assert!(reports[0].outcome.is_failed());
        assert!(matches!(reports[1].outcome, FileOutcome::Success(_)));
        assert!(matches!(reports[2].outcome, FileOutcome::Success(_)));
        Ok(())
    }
}
