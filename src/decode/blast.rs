// src/decode/blast.rs

//! PKWare Data Compression Library "explode".
//!
//! The stream starts with two bytes: literal mode (0 = raw bytes, 1 = Huffman
//! coded) and dictionary size in bits (4, 5 or 6). What follows is a bit
//! stream, least-significant bit first, of literals and length/distance
//! pairs. A length of 519 terminates the stream.

use crate::error::ExplodeError;
use once_cell::sync::Lazy;

const MAX_BITS: usize = 13;
const END_OF_STREAM: usize = 519;

// Code lengths in compact form: low nibble = length, high nibble = repeat - 1.
#[rustfmt::skip]
const LITERAL_LENGTHS: [u8; 98] = [
    11, 124, 8, 7, 28, 7, 188, 13, 76, 4, 10, 8, 12, 10, 12, 10, 8, 23, 8,
    9, 7, 6, 7, 8, 7, 6, 55, 8, 23, 24, 12, 11, 7, 9, 11, 12, 6, 7, 22, 5,
    7, 24, 6, 11, 9, 6, 7, 22, 7, 11, 38, 7, 9, 8, 25, 11, 8, 11, 9, 12,
    8, 12, 5, 38, 5, 38, 5, 11, 7, 5, 6, 21, 6, 10, 53, 8, 7, 24, 10, 27,
    44, 253, 253, 253, 252, 252, 252, 13, 12, 45, 12, 45, 12, 61, 12, 45,
    44, 173,
];
const LENGTH_LENGTHS: [u8; 6] = [2, 35, 36, 53, 38, 23];
const DISTANCE_LENGTHS: [u8; 7] = [2, 20, 53, 230, 247, 151, 248];

const LENGTH_BASE: [u16; 16] = [3, 2, 4, 5, 6, 7, 8, 9, 10, 12, 16, 24, 40, 72, 136, 264];
const LENGTH_EXTRA: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8];

static LITERAL_CODE: Lazy<Huffman> = Lazy::new(|| Huffman::from_compact(&LITERAL_LENGTHS));
static LENGTH_CODE: Lazy<Huffman> = Lazy::new(|| Huffman::from_compact(&LENGTH_LENGTHS));
static DISTANCE_CODE: Lazy<Huffman> = Lazy::new(|| Huffman::from_compact(&DISTANCE_LENGTHS));

/// Canonical Huffman code: symbol counts per length plus symbols ordered by code.
struct Huffman {
    count: [u16; 16],
    symbol: Vec<u16>,
}

impl Huffman {
    fn from_compact(rep: &[u8]) -> Self {
        let lengths: Vec<u8> = rep
            .iter()
            .flat_map(|&b| std::iter::repeat(b & 0x0f).take((b >> 4) as usize + 1))
            .collect();

        let mut count = [0u16; 16];
        for &len in &lengths {
            count[len as usize] += 1;
        }

        let mut offsets = [0u16; 16];
        for len in 1..15 {
            offsets[len + 1] = offsets[len] + count[len];
        }

        let mut symbol = vec![0u16; lengths.len()];
        for (sym, &len) in lengths.iter().enumerate() {
            if len != 0 {
                let slot = &mut offsets[len as usize];
                symbol[*slot as usize] = sym as u16;
                *slot += 1;
            }
        }

        Self { count, symbol }
    }
}

struct BitReader<'a> {
    input: &'a [u8],
    pos: usize,
    buf: u32,
    cnt: u32,
}

impl<'a> BitReader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            buf: 0,
            cnt: 0,
        }
    }

    fn bits(&mut self, need: u32) -> Result<u32, ExplodeError> {
        let mut val = self.buf;
        while self.cnt < need {
            let byte = *self
                .input
                .get(self.pos)
                .ok_or(ExplodeError::UnexpectedEof)?;
            self.pos += 1;
            val |= u32::from(byte) << self.cnt;
            self.cnt += 8;
        }
        self.buf = val >> need;
        self.cnt -= need;
        Ok(val & ((1 << need) - 1))
    }

    /// Codes are stored bit-inverted, most significant bit first.
    fn decode(&mut self, h: &Huffman) -> Result<usize, ExplodeError> {
        let (mut code, mut first, mut index) = (0i32, 0i32, 0i32);
        for len in 1..=MAX_BITS {
            code |= (self.bits(1)? as i32) ^ 1;
            let count = i32::from(h.count[len]);
            if code < first + count {
                return Ok(usize::from(h.symbol[(index + code - first) as usize]));
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }
        Err(ExplodeError::InvalidCode)
    }
}

/// Expand a complete implode stream into at most `limit` bytes.
pub fn explode(input: &[u8], limit: usize) -> Result<Vec<u8>, ExplodeError> {
    let mut bits = BitReader::new(input);

    let literal_mode = bits.bits(8)?;
    if literal_mode > 1 {
        return Err(ExplodeError::LiteralMode(literal_mode));
    }
    let dict_bits = bits.bits(8)?;
    if !(4..=6).contains(&dict_bits) {
        return Err(ExplodeError::DictionarySize(dict_bits));
    }

    let mut out = Vec::with_capacity(input.len().saturating_mul(4).min(limit));
    loop {
        if bits.bits(1)? == 1 {
            let symbol = bits.decode(&LENGTH_CODE)?;
            let len = usize::from(LENGTH_BASE[symbol])
                + bits.bits(u32::from(LENGTH_EXTRA[symbol]))? as usize;
            if len == END_OF_STREAM {
                break;
            }
            let shift = if len == 2 { 2 } else { dict_bits };
            let distance = ((bits.decode(&DISTANCE_CODE)? << shift)
                | bits.bits(shift)? as usize)
                + 1;
            if distance > out.len() {
                return Err(ExplodeError::DistanceTooFar {
                    distance,
                    available: out.len(),
                });
            }
            if out.len() + len > limit {
                return Err(ExplodeError::OutputTooLarge { limit });
            }
            // overlapping copies repeat the tail, so copy byte by byte
            let start = out.len() - distance;
            for i in 0..len {
                let b = out[start + i];
                out.push(b);
            }
        } else {
            let byte = if literal_mode == 1 {
                bits.decode(&LITERAL_CODE)? as u8
            } else {
                bits.bits(8)? as u8
            };
            if out.len() == limit {
                return Err(ExplodeError::OutputTooLarge { limit });
            }
            out.push(byte);
        }
    }
    Ok(out)
}
