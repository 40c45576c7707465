// src/decode/dbf.rs

use super::{RawTable, TextEncoding};
use crate::error::DecodeError;

const FILE_HEADER_LEN: usize = 32;
const FIELD_DESCRIPTOR_LEN: usize = 32;
const HEADER_TERMINATOR: u8 = 0x0D;
const END_OF_FILE: u8 = 0x1A;
const DELETED: u8 = b'*';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbfField {
    pub name: String,
    pub kind: char,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbfHeader {
    pub record_count: usize,
    pub header_len: usize,
    pub record_len: usize,
    pub fields: Vec<DbfField>,
}

fn le_u16(bytes: &[u8], at: usize) -> usize {
    usize::from(u16::from_le_bytes([bytes[at], bytes[at + 1]]))
}

fn le_u32(bytes: &[u8], at: usize) -> usize {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]) as usize
}

/// Read the header length stored at bytes 8..10 without parsing the rest.
pub(crate) fn declared_header_len(bytes: &[u8]) -> Result<usize, DecodeError> {
    if bytes.len() < 10 {
        return Err(DecodeError::Truncated {
            what: "dBase preamble",
            needed: 10,
            available: bytes.len(),
        });
    }
    Ok(le_u16(bytes, 8))
}

/// Size of the record section the preamble promises: record count times
/// record length, plus the end-of-file marker. Saturates on absurd headers.
pub(crate) fn declared_body_len(bytes: &[u8]) -> Result<usize, DecodeError> {
    if bytes.len() < 12 {
        return Err(DecodeError::Truncated {
            what: "dBase preamble",
            needed: 12,
            available: bytes.len(),
        });
    }
    Ok(le_u32(bytes, 4)
        .saturating_mul(le_u16(bytes, 10))
        .saturating_add(1))
}

pub fn parse_header(bytes: &[u8]) -> Result<DbfHeader, DecodeError> {
    if bytes.len() < FILE_HEADER_LEN {
        return Err(DecodeError::Truncated {
            what: "dBase header",
            needed: FILE_HEADER_LEN,
            available: bytes.len(),
        });
    }
    let record_count = le_u32(bytes, 4);
    let header_len = le_u16(bytes, 8);
    let record_len = le_u16(bytes, 10);

    if header_len <= FILE_HEADER_LEN {
        return Err(DecodeError::InvalidHeader(format!(
            "header length {header_len} leaves no room for field descriptors"
        )));
    }
    if bytes.len() < header_len {
        return Err(DecodeError::Truncated {
            what: "dBase field descriptors",
            needed: header_len,
            available: bytes.len(),
        });
    }

    let mut fields = Vec::new();
    let mut pos = FILE_HEADER_LEN;
    while pos + FIELD_DESCRIPTOR_LEN <= header_len && bytes[pos] != HEADER_TERMINATOR {
        let desc = &bytes[pos..pos + FIELD_DESCRIPTOR_LEN];
        let name_end = desc[..11].iter().position(|&b| b == 0).unwrap_or(11);
        fields.push(DbfField {
            name: String::from_utf8_lossy(&desc[..name_end]).trim().to_string(),
            kind: desc[11] as char,
            length: usize::from(desc[16]),
        });
        pos += FIELD_DESCRIPTOR_LEN;
    }

    if fields.is_empty() {
        return Err(DecodeError::InvalidHeader("no field descriptors".into()));
    }
    let data_width: usize = fields.iter().map(|f| f.length).sum();
    if data_width + 1 > record_len {
        return Err(DecodeError::InvalidHeader(format!(
            "fields span {} bytes but records are {record_len} bytes",
            data_width + 1
        )));
    }

    Ok(DbfHeader {
        record_count,
        header_len,
        record_len,
        fields,
    })
}

/// Decode the fixed-width records that follow the header.
///
/// Deleted records are dropped. Values are trimmed.
pub fn read_records(
    header: &DbfHeader,
    body: &[u8],
    encoding: TextEncoding,
) -> Result<Vec<Vec<String>>, DecodeError> {
    // the declared count must fit in the body before it sizes anything
    let needed = header.record_count.saturating_mul(header.record_len);
    let truncated = || DecodeError::Truncated {
        what: "dBase records",
        needed,
        available: body.len(),
    };
    if needed > body.len() {
        return Err(truncated());
    }

    let mut rows = Vec::with_capacity(header.record_count);
    for i in 0..header.record_count {
        let start = i * header.record_len;
        let end = start + header.record_len;
        if body[start] == END_OF_FILE {
            return Err(truncated());
        }
        let record = &body[start..end];
        if record[0] == DELETED {
            continue;
        }

        let mut offset = 1;
        let mut row = Vec::with_capacity(header.fields.len());
        for field in &header.fields {
            let raw = &record[offset..offset + field.length];
            row.push(encoding.decode(raw).trim().to_string());
            offset += field.length;
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Parse a complete dBase III file held in memory.
pub fn read_table(bytes: &[u8], encoding: TextEncoding) -> Result<RawTable, DecodeError> {
    let header = parse_header(bytes)?;
    let rows = read_records(&header, &bytes[header.header_len..], encoding)?;
    Ok(RawTable {
        headers: header.fields.into_iter().map(|f| f.name).collect(),
        rows,
    })
}
