// src/output/mod.rs
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::aggregate::MasterSummary;
use crate::reshape::reshape;

pub mod long;
pub mod report;
pub mod wide;

pub use report::RunReport;

pub const COL_REGION: &str = "UF_ATENDIMENTO";
pub const COL_YEAR: &str = "ANO_ATENDIMENTO";
pub const COL_SEX: &str = "SEXO";
pub const COL_AGE: &str = "FAIXA_ETARIA";
pub const COL_CATEGORY: &str = "PROC_GRU_NOME";
pub const COL_BODY_REGION: &str = "REGIAO_CORPORAL_DETALHADA";
pub const COL_COUNT: &str = "TOTAL_PROCEDIMENTOS";

pub const LONG_CSV: &str = "datasus_sumario_nacional_long.csv";
pub const LONG_PARQUET: &str = "datasus_sumario_nacional_long.parquet";
pub const WIDE_DIR: &str = "wide";
pub const REPORT_JSON: &str = "run_report.json";

#[derive(Debug, Clone)]
pub struct WrittenOutputs {
    pub long_csv: PathBuf,
    pub long_parquet: PathBuf,
    pub wide: Vec<PathBuf>,
    pub report: PathBuf,
}

/// Write every artefact of a successful run under `output_dir`.
pub fn write_all(summary: &MasterSummary, output_dir: &Path) -> Result<WrittenOutputs> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let long_csv = output_dir.join(LONG_CSV);
    long::write_csv(&summary.table, &long_csv)?;

    let long_parquet = output_dir.join(LONG_PARQUET);
    long::write_parquet(&summary.table, &long_parquet)?;

    let wide_tables = reshape(&summary.table);
    let wide = wide::write_all(&wide_tables, &output_dir.join(WIDE_DIR))?;

    let report = output_dir.join(REPORT_JSON);
    RunReport::from_summary(summary).write(&report)?;

    info!(
        dir = %output_dir.display(),
        rows = summary.table.len(),
        regions = wide.len(),
        "outputs written"
    );
    Ok(WrittenOutputs {
        long_csv,
        long_parquet,
        wide,
        report,
    })
}
