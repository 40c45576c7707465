// src/error.rs

use std::{io, path::PathBuf};
use thiserror::Error;

/// Faults raised while turning archive bytes into a table.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unsupported archive format: {0:?}")]
    UnsupportedFormat(String),
    #[error("truncated {what}: need {needed} bytes, found {available}")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("invalid dBase header: {0}")]
    InvalidHeader(String),
    #[error("implode stream: {0}")]
    Explode(#[from] ExplodeError),
}

/// Faults in a PKWare DCL implode stream.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ExplodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid literal mode {0}")]
    LiteralMode(u32),
    #[error("invalid dictionary size {0}")]
    DictionarySize(u32),
    #[error("distance {distance} reaches before start of output ({available} bytes written)")]
    DistanceTooFar { distance: usize, available: usize },
    #[error("invalid huffman code")]
    InvalidCode,
    #[error("output exceeds the {limit} bytes the header allows")]
    OutputTooLarge { limit: usize },
}

/// Why a single archive file could not be summarised.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error("decoder panicked on {}: {message}", path.display())]
    DecodePanic { path: PathBuf, message: String },
    #[error("file name {0:?} does not carry a region code and two-digit year at offsets 4..8")]
    BadFileName(String),
    #[error("required column {0:?} is missing")]
    MissingField(String),
}
