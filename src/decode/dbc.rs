// src/decode/dbc.rs

//! DATASUS `.dbc` container.
//!
//! A dBase file whose header is stored verbatim, followed by a 4-byte CRC
//! and the imploded record section.

use super::{blast, dbf, RawTable, TextEncoding};
use crate::error::DecodeError;

const CRC_LEN: usize = 4;

/// Rebuild the plain dBase bytes from a `.dbc` payload.
pub fn expand(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let header_len = dbf::declared_header_len(bytes)?;
    let body_start = header_len + CRC_LEN;
    if bytes.len() < body_start {
        return Err(DecodeError::Truncated {
            what: "dbc header",
            needed: body_start,
            available: bytes.len(),
        });
    }

    let limit = dbf::declared_body_len(bytes)?;
    let records = blast::explode(&bytes[body_start..], limit)?;
    let mut out = Vec::with_capacity(header_len + records.len());
    out.extend_from_slice(&bytes[..header_len]);
    out.extend_from_slice(&records);
    Ok(out)
}

pub fn read_table(bytes: &[u8], encoding: TextEncoding) -> Result<RawTable, DecodeError> {
    let dbf_bytes = expand(bytes)?;
    dbf::read_table(&dbf_bytes, encoding)
}
