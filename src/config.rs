// src/config.rs
use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::decode::TextEncoding;

/// Federative units published by DATASUS, in the order the portal lists them.
pub const STATES: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB",
    "PR", "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

/// Column names read from each archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub procedure: String,
    pub sex: String,
    pub age: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            procedure: "PROC_REA".into(),
            sex: "SEXO".into(),
            age: "IDADE".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Directory URL the archive names are appended to.
    pub base_url: String,
    pub prefix: String,
    pub states: Vec<String>,
    pub start_year: u16,
    pub end_year: u16,
    pub months: Vec<u8>,
    /// Pause between consecutive downloads.
    pub delay_secs: u64,
    pub timeout_secs: u64,
    pub skip_existing: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "ftp://ftp.datasus.gov.br/dissemin/publicos/CIHA/201101_/Dados/".into(),
            prefix: "CIHA".into(),
            states: STATES.iter().map(|s| s.to_string()).collect(),
            start_year: 2011,
            end_year: u16::try_from(Utc::now().year()).unwrap_or(2011),
            months: (1..=12).collect(),
            delay_secs: 4,
            timeout_secs: 60,
            skip_existing: true,
        }
    }
}

/// Everything the binary can be told, with a default for every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub encoding: TextEncoding,
    /// Worker threads for file processing; `None` uses one per core.
    pub threads: Option<usize>,
    pub fields: FieldNames,
    pub fetch: FetchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            encoding: TextEncoding::default(),
            threads: None,
            fields: FieldNames::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Config {
    /// Read a YAML config file, or fall back to defaults when none is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        if config.fetch.start_year > config.fetch.end_year {
            anyhow::bail!(
                "fetch.start_year {} is after fetch.end_year {}",
                config.fetch.start_year,
                config.fetch.end_year
            );
        }
        Ok(config)
    }
}
