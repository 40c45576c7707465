// src/decode/mod.rs
use std::{fs, path::Path};
use tracing::debug;

use crate::error::DecodeError;

pub mod blast;
pub mod dbc;
pub mod dbf;
pub mod encoding;

pub use encoding::TextEncoding;

/// Every record of one archive file, as strings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Column names from the dBase field descriptors.
    pub headers: Vec<String>,
    /// One entry per live (non-deleted) record, one value per column.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Column position by name, ignoring ASCII case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = RawRecord<'_>> {
        self.rows.iter().map(|values| RawRecord {
            headers: &self.headers,
            values,
        })
    }
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    headers: &'a [String],
    values: &'a [String],
}

impl<'a> RawRecord<'a> {
    /// Value at a column position; `None` for short rows.
    pub fn value(&self, index: usize) -> Option<&'a str> {
        self.values.get(index).map(String::as_str)
    }

    /// Value by column name, ignoring ASCII case.
    #[cfg(test)]
    pub(crate) fn get(&self, field: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(field))
            .and_then(|i| self.value(i))
    }
}

/// Turns an archive file on disk into a [`RawTable`].
pub trait RecordDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<RawTable, DecodeError>;
}

/// Decoder for `.dbc` and plain `.dbf` archives, chosen by extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveDecoder {
    pub encoding: TextEncoding,
}

impl ArchiveDecoder {
    pub fn new(encoding: TextEncoding) -> Self {
        Self { encoding }
    }
}

impl RecordDecoder for ArchiveDecoder {
    fn decode(&self, path: &Path) -> Result<RawTable, DecodeError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let bytes = fs::read(path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "decoding archive");
        match ext.as_str() {
            "dbc" => dbc::read_table(&bytes, self.encoding),
            "dbf" => dbf::read_table(&bytes, self.encoding),
            _ => Err(DecodeError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn dispatches_on_extension() -> Result<()> {
        let dir = tempdir()?;
        let dbf_bytes = dbf::tests::build_dbf(
            &[("PROC_REA", 10), ("SEXO", 1)],
            &[(false, vec!["0204030170", "1"])],
        );
        let dbf_path = dir.path().join("CIHASP2301.dbf");
        let dbc_path = dir.path().join("CIHASP2301.DBC");
        fs::write(&dbf_path, &dbf_bytes)?;
        fs::write(&dbc_path, dbc::tests::build_dbc(&dbf_bytes))?;

        let decoder = ArchiveDecoder::default();
        assert_eq!(decoder.decode(&dbf_path)?, decoder.decode(&dbc_path)?);

        let csv_path = dir.path().join("CIHASP2301.csv");
        fs::write(&csv_path, "PROC_REA\n0204030170\n")?;
        assert!(matches!(
            decoder.decode(&csv_path),
            Err(DecodeError::UnsupportedFormat(ext)) if ext == "csv"
        ));
        Ok(())
    }

    #[test]
    fn record_lookup_by_name() {
        let table = RawTable {
            headers: vec!["PROC_REA".into(), "SEXO".into()],
            rows: vec![vec!["0204030170".into(), "3".into()], vec!["02".into()]],
        };
        let records: Vec<_> = table.records().collect();
        assert_eq!(records[0].get("sexo"), Some("3"));
        assert_eq!(records[0].get("IDADE"), None);
        assert_eq!(records[1].get("SEXO"), None);
        assert_eq!(table.column_index("proc_rea"), Some(0));
    }
}
