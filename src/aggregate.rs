// src/aggregate.rs

//! Grouped counts and the cross-file roll-up.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
};
use tracing::{info, warn};

use crate::enrich::{AgeBucket, EnrichedRecord, Sex};
use crate::error::ProcessError;
use crate::process::{FileOutcome, FileReport};

/// The six dimensions every count is grouped by.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AggregateKey {
    pub region: String,
    pub year: u16,
    pub sex: Sex,
    pub age: AgeBucket,
    pub category: &'static str,
    pub body_region: &'static str,
}

impl From<&EnrichedRecord<'_>> for AggregateKey {
    fn from(e: &EnrichedRecord<'_>) -> Self {
        Self {
            region: e.region.to_string(),
            year: e.year,
            sex: e.sex,
            age: e.age,
            category: e.class.category,
            body_region: e.class.body_region,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    pub key: AggregateKey,
    pub count: u64,
}

/// Counts keyed by [`AggregateKey`]; each key appears once.
///
/// Ordered by key so every writer sees the same row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LongTable {
    counts: BTreeMap<AggregateKey, u64>,
}

impl LongTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: AggregateKey, count: u64) {
        *self.counts.entry(key).or_insert(0) += count;
    }

    pub fn increment(&mut self, key: AggregateKey) {
        self.add(key, 1);
    }

    /// Sum another table into this one.
    pub fn merge(&mut self, other: LongTable) {
        for (key, count) in other.counts {
            self.add(key, count);
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn get(&self, key: &AggregateKey) -> Option<u64> {
        self.counts.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AggregateKey, u64)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }

    pub fn into_rows(self) -> Vec<AggregateRow> {
        self.counts
            .into_iter()
            .map(|(key, count)| AggregateRow { key, count })
            .collect()
    }

    pub fn regions(&self) -> BTreeSet<&str> {
        self.counts.keys().map(|k| k.region.as_str()).collect()
    }

    pub fn years(&self) -> BTreeSet<u16> {
        self.counts.keys().map(|k| k.year).collect()
    }
}

impl FromIterator<AggregateRow> for LongTable {
    fn from_iter<I: IntoIterator<Item = AggregateRow>>(iter: I) -> Self {
        let mut table = LongTable::new();
        table.extend(iter);
        table
    }
}

impl Extend<AggregateRow> for LongTable {
    fn extend<I: IntoIterator<Item = AggregateRow>>(&mut self, iter: I) {
        for row in iter {
            self.add(row.key, row.count);
        }
    }
}

#[derive(Debug)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: ProcessError,
}

/// Everything the roll-up learned from a batch of files.
#[derive(Debug)]
pub struct MasterSummary {
    pub table: LongTable,
    pub succeeded: Vec<PathBuf>,
    pub empty: Vec<PathBuf>,
    pub failed: Vec<FailedFile>,
}

#[derive(Debug)]
pub enum MasterOutcome {
    Summary(MasterSummary),
    /// Not a single file was processed, successfully or empty.
    NoUsableInput { failed: Vec<FailedFile> },
}

/// Roll per-file outcomes up into one canonical table.
///
/// Rows are always re-summed by key, even though files rarely share keys.
pub fn combine(reports: Vec<FileReport>) -> MasterOutcome {
    let mut table = LongTable::new();
    let mut succeeded = Vec::new();
    let mut empty = Vec::new();
    let mut failed = Vec::new();

    for FileReport { path, outcome } in reports {
        match outcome {
            FileOutcome::Success(rows) => {
                table.extend(rows);
                succeeded.push(path);
            }
            FileOutcome::Empty(_) => empty.push(path),
            FileOutcome::Failed(error) => failed.push(FailedFile { path, error }),
        }
    }

    if succeeded.is_empty() && empty.is_empty() {
        warn!(failed = failed.len(), "no file produced usable data");
        return MasterOutcome::NoUsableInput { failed };
    }

    info!(
        rows = table.len(),
        procedures = table.total(),
        succeeded = succeeded.len(),
        empty = empty.len(),
        failed = failed.len(),
        "combined file summaries"
    );
    MasterOutcome::Summary(MasterSummary {
        table,
        succeeded,
        empty,
        failed,
    })
}
