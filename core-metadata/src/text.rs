//! Text decoding for tag payloads and output sanitization.
//!
//! ID3v2 prefixes every text payload with an encoding byte; FLAC and MP4
//! always use UTF-8. Decoding is lossy and never fails: malformed sequences
//! become U+FFFD and an unknown encoding byte yields an empty string, so one
//! bad field cannot abort a whole parse.

use encoding_rs::{UTF_16BE, UTF_16LE};
use std::borrow::Cow;

/// Text encodings defined by ID3v2.3/2.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// ISO-8859-1, terminated with 0x00.
    Latin1,
    /// UTF-16 with byte-order mark, terminated with 0x00 0x00.
    Utf16Bom,
    /// UTF-16 big-endian without BOM, terminated with 0x00 0x00.
    Utf16Be,
    /// UTF-8, terminated with 0x00.
    Utf8,
}

impl TextEncoding {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Latin1),
            1 => Some(Self::Utf16Bom),
            2 => Some(Self::Utf16Be),
            3 => Some(Self::Utf8),
            _ => None,
        }
    }

    /// Width in bytes of the string terminator for this encoding.
    pub fn terminator_width(&self) -> usize {
        match self {
            Self::Latin1 | Self::Utf8 => 1,
            Self::Utf16Bom | Self::Utf16Be => 2,
        }
    }
}

/// Decodes `data` and strips nulls, BOMs and U+FFFF, then trims.
pub fn decode_text(encoding: TextEncoding, data: &[u8]) -> String {
    let decoded: Cow<'_, str> = match encoding {
        TextEncoding::Latin1 => Cow::Owned(data.iter().map(|&b| b as char).collect()),
        TextEncoding::Utf8 => String::from_utf8_lossy(data),
        // A BOM overrides the default endianness; BOM-less "with BOM" text is
        // almost always little-endian in the wild.
        TextEncoding::Utf16Bom => UTF_16LE.decode(data).0,
        TextEncoding::Utf16Be => UTF_16BE.decode(data).0,
    };

    clean_decoded(&decoded)
}

/// Decodes text whose encoding byte may be invalid.
pub fn decode_with_byte(encoding: u8, data: &[u8]) -> String {
    match TextEncoding::from_byte(encoding) {
        Some(encoding) => decode_text(encoding, data),
        None => {
            tracing::trace!(encoding, "Unknown text encoding byte");
            String::new()
        }
    }
}

/// Decodes a UTF-8 payload (Vorbis comments, MP4 strings).
pub fn decode_utf8(data: &[u8]) -> String {
    decode_text(TextEncoding::Utf8, data)
}

fn clean_decoded(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\0' | '\u{FEFF}' | '\u{FFFE}' | '\u{FFFF}'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Normalizes a single-line field (title, artist, album).
///
/// - Trims leading/trailing whitespace
/// - Normalizes consecutive whitespace to single space
/// - Removes null bytes and control characters
pub fn sanitize_field(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

/// Normalizes multi-line text (lyrics): keeps line breaks, drops every other
/// control character and trims the whole block.
pub fn sanitize_multiline(text: &str) -> String {
    text.replace("\r\n", "\n")
        .chars()
        .map(|c| if c == '\r' { '\n' } else { c })
        .filter(|c| *c == '\n' || !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}
