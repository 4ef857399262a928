//! # Format Detection Module
//!
//! Classifies an input once into an [`AudioFormat`] so the extractor can
//! pattern-match straight into the matching container parser.
//!
//! Classification is driven by the lowercase file extension. Magic-byte
//! sniffing only kicks in when the name has no extension at all (e.g. a
//! blob handed over from a file picker); an unrecognized extension stays
//! [`AudioFormat::Unknown`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// File extensions the extractor understands.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "flac", "m4a", "mp4"];

/// Container formats with a dedicated tag parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Flac,
    Mp3,
    M4a,
    Unknown,
}

impl AudioFormat {
    /// Map a bare extension (without the dot, any case).
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "flac" => Self::Flac,
            "mp3" => Self::Mp3,
            "m4a" | "mp4" => Self::M4a,
            _ => Self::Unknown,
        }
    }

    /// Classify by file name extension only.
    ///
    /// # Example
    ///
    /// ```rust
    /// use core_metadata::AudioFormat;
    ///
    /// assert_eq!(AudioFormat::from_file_name("Song.FLAC"), AudioFormat::Flac);
    /// assert_eq!(AudioFormat::from_file_name("clip.mp4"), AudioFormat::M4a);
    /// assert_eq!(AudioFormat::from_file_name("notes.txt"), AudioFormat::Unknown);
    /// ```
    pub fn from_file_name(file_name: &str) -> Self {
        file_extension(file_name)
            .map(|ext| Self::from_extension(&ext))
            .unwrap_or(Self::Unknown)
    }

    /// Classify by leading magic bytes.
    pub fn from_signature(data: &[u8]) -> Self {
        if data.starts_with(b"fLaC") {
            Self::Flac
        } else if data.starts_with(b"ID3") {
            Self::Mp3
        } else if data.len() >= 8 && &data[4..8] == b"ftyp" {
            Self::M4a
        } else {
            Self::Unknown
        }
    }

    /// Extension first; signature only for extension-less names.
    pub fn detect(file_name: &str, data: &[u8]) -> Self {
        match file_extension(file_name) {
            Some(ext) => Self::from_extension(&ext),
            None => {
                let format = Self::from_signature(data);
                debug!(?format, "No file extension, sniffed signature");
                format
            }
        }
    }

    /// MIME type of the container.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Flac => "audio/flac",
            Self::Mp3 => "audio/mpeg",
            Self::M4a => "audio/mp4",
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Canonical extension, used as a probe hint.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Flac => Some("flac"),
            Self::Mp3 => Some("mp3"),
            Self::M4a => Some("m4a"),
            Self::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Lowercase extension of `file_name`, if any.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase())
}

/// File name with its extension stripped; the name itself when there is no stem.
pub fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| file_name.to_string())
}

/// True for names whose extension the extractor can parse.
pub fn is_supported_file(file_name: &str) -> bool {
    file_extension(file_name)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}
