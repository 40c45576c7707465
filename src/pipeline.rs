// src/pipeline.rs
use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::aggregate::{combine, FailedFile, MasterOutcome};
use crate::config::Config;
use crate::decode::ArchiveDecoder;
use crate::output::{self, RunReport, WrittenOutputs, REPORT_JSON};
use crate::process::{discover_archives, process_all, FileAggregator};

#[derive(Debug)]
pub enum ProcessRun {
    Completed {
        outputs: WrittenOutputs,
        failed: Vec<FailedFile>,
    },
    NoUsableInput {
        failed: Vec<FailedFile>,
    },
}

/// Discover, summarise and write everything for one data directory.
///
/// Blocking; call it from `spawn_blocking` inside async code.
#[instrument(level = "info", skip(config), fields(data_dir = %config.data_dir.display()))]
pub fn process_directory(config: &Config) -> Result<ProcessRun> {
    // 1) discover
    let paths = discover_archives(&config.data_dir)
        .with_context(|| format!("listing archives in {}", config.data_dir.display()))?;
    info!(files = paths.len(), "archives found");

    // 2) per-file summaries
    let decoder = ArchiveDecoder::new(config.encoding);
    let aggregator = FileAggregator::new(&decoder, &config.fields);
    let reports = process_all(&paths, &aggregator, config.threads)?;

    // 3) roll up and write
    match combine(reports) {
        MasterOutcome::Summary(summary) => {
            let outputs = output::write_all(&summary, &config.output_dir)?;
            Ok(ProcessRun::Completed {
                outputs,
                failed: summary.failed,
            })
        }
        MasterOutcome::NoUsableInput { failed } => {
            RunReport::from_failures(&failed).write(&config.output_dir.join(REPORT_JSON))?;
            Ok(ProcessRun::NoUsableInput { failed })
        }
    }
}
