// src/decode/encoding.rs

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Single-byte code pages found in DATASUS archives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    #[default]
    #[serde(alias = "ibm850")]
    Cp850,
    #[serde(alias = "iso-8859-1")]
    Latin1,
    #[serde(alias = "utf-8")]
    Utf8,
}

impl TextEncoding {
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Cp850 => bytes
                .iter()
                .map(|&b| {
                    if b < 0x80 {
                        b as char
                    } else {
                        CP850_HIGH[(b - 0x80) as usize]
                    }
                })
                .collect(),
            TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cp850" | "ibm850" => Ok(TextEncoding::Cp850),
            "latin1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            other => Err(format!("unknown encoding {other:?}")),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TextEncoding::Cp850 => "cp850",
            TextEncoding::Latin1 => "latin1",
            TextEncoding::Utf8 => "utf8",
        })
    }
}

/// Code points for bytes 0x80..=0xFF.
#[rustfmt::skip]
static CP850_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', 'ø', '£', 'Ø', '×', 'ƒ',
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '®', '¬', '½', '¼', '¡', '«', '»',
    '░', '▒', '▓', '│', '┤', 'Á', 'Â', 'À', '©', '╣', '║', '╗', '╝', '¢', '¥', '┐',
    '└', '┴', '┬', '├', '─', '┼', 'ã', 'Ã', '╚', '╔', '╩', '╦', '╠', '═', '╬', '¤',
    'ð', 'Ð', 'Ê', 'Ë', 'È', 'ı', 'Í', 'Î', 'Ï', '┘', '┌', '█', '▄', '¦', 'Ì', '▀',
    'Ó', 'ß', 'Ô', 'Ò', 'õ', 'Õ', 'µ', 'þ', 'Þ', 'Ú', 'Û', 'Ù', 'ý', 'Ý', '¯', '´',
    '\u{ad}', '±', '‗', '¾', '¶', '§', '÷', '¸', '°', '¨', '·', '¹', '³', '²', '■', '\u{a0}',
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cp850_portuguese_letters() {
        // "AÇÃO" and "ção" as written by DOS-era tools
        assert_eq!(TextEncoding::Cp850.decode(&[b'A', 0x80, 0xC7, b'O']), "AÇÃO");
        assert_eq!(TextEncoding::Cp850.decode(&[0x87, 0xC6, b'o']), "ção");
    }

    #[test]
    fn latin1_maps_bytes_to_code_points() {
        assert_eq!(TextEncoding::Latin1.decode(&[0xE7, 0xE3, b'o']), "ção");
    }

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("CP850".parse::<TextEncoding>(), Ok(TextEncoding::Cp850));
        assert_eq!("iso-8859-1".parse::<TextEncoding>(), Ok(TextEncoding::Latin1));
        assert_eq!("utf-8".parse::<TextEncoding>(), Ok(TextEncoding::Utf8));
        assert!("ebcdic".parse::<TextEncoding>().is_err());
    }
}
