// src/output/report.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fs, path::Path};

use crate::aggregate::{FailedFile, MasterSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureEntry {
    pub file: String,
    pub reason: String,
}

/// Machine-readable summary of one processing run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub files_seen: usize,
    pub succeeded: usize,
    pub empty: usize,
    pub failed: usize,
    pub failures: Vec<FailureEntry>,
    pub rows: usize,
    pub procedures: u64,
    pub regions: Vec<String>,
    pub years: Vec<u16>,
}

fn failure_entries(failed: &[FailedFile]) -> Vec<FailureEntry> {
    failed
        .iter()
        .map(|f| FailureEntry {
            file: f.path.display().to_string(),
            reason: f.error.to_string(),
        })
        .collect()
}

impl RunReport {
    pub fn from_summary(summary: &MasterSummary) -> Self {
        Self {
            generated_at: Utc::now(),
            files_seen: summary.succeeded.len() + summary.empty.len() + summary.failed.len(),
            succeeded: summary.succeeded.len(),
            empty: summary.empty.len(),
            failed: summary.failed.len(),
            failures: failure_entries(&summary.failed),
            rows: summary.table.len(),
            procedures: summary.table.total(),
            regions: summary.table.regions().into_iter().map(String::from).collect(),
            years: summary.table.years().into_iter().collect(),
        }
    }

    /// Report for a run where no file was usable.
    pub fn from_failures(failed: &[FailedFile]) -> Self {
        Self {
            generated_at: Utc::now(),
            files_seen: failed.len(),
            succeeded: 0,
            empty: 0,
            failed: failed.len(),
            failures: failure_entries(failed),
            rows: 0,
            procedures: 0,
            regions: Vec::new(),
            years: Vec::new(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).context("serialising run report")?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregateKey, AggregateRow, LongTable};
    use crate::enrich::{AgeBucket, Sex};
    use crate::error::ProcessError;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn summary_report_counts_and_reasons() -> Result<()> {
        let table: LongTable = vec![AggregateRow {
            key: AggregateKey {
                region: "PE".into(),
                year: 2018,
                sex: Sex::Male,
                age: AgeBucket::From0To4,
                category: "US",
                body_region: "General",
            },
            count: 6,
        }]
        .into_iter()
        .collect();
        let summary = MasterSummary {
            table,
            succeeded: vec![PathBuf::from("CIHAPE1801.dbc")],
            empty: vec![PathBuf::from("CIHAPE1802.dbc")],
            failed: vec![FailedFile {
                path: PathBuf::from("CIHAPE1803.dbc"),
                error: ProcessError::NotFound(PathBuf::from("CIHAPE1803.dbc")),
            }],
        };

        let dir = tempdir()?;
        let path = dir.path().join("nested").join("report.json");
        RunReport::from_summary(&summary).write(&path)?;

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(value["files_seen"], 3);
        assert_eq!(value["empty"], 1);
        assert_eq!(value["procedures"], 6);
        assert_eq!(value["regions"], serde_json::json!(["PE"]));
        assert_eq!(value["years"], serde_json::json!([2018]));
        assert_eq!(value["failures"][0]["file"], "CIHAPE1803.dbc");
        assert!(value["failures"][0]["reason"]
            .as_str()
            .unwrap()
            .contains("not found"));
        assert!(value["generated_at"].is_string());
        Ok(())
    }

    #[test]
    fn failure_only_report() {
        let failed = vec![FailedFile {
            path: PathBuf::from("CIHASP2301.dbc"),
            error: ProcessError::BadFileName("CIHASP2301.dbc".into()),
        }];
        let report = RunReport::from_failures(&failed);
        assert_eq!(report.files_seen, 1);
        assert_eq!(report.failed, 1);
        assert!(report.regions.is_empty());
    }
}
