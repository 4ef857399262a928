//! # Metadata & Lyrics Module
//!
//! Extracts tags, lyrics and cover art from raw audio file bytes.
//!
//! ## Overview
//!
//! This module handles:
//! - FLAC metadata blocks (VORBIS_COMMENT, PICTURE)
//! - ID3v2.3/2.4 tags (text frames, USLT, SYLT, APIC)
//! - MP4/M4A cover art (`covr` atoms)
//! - LRC lyric parsing into time-synced lines
//! - Default merging, duration probing and result caching
//!
//! Parsing never fails: malformed input degrades to defaults.

pub mod artwork;
pub mod binary;
pub mod cache;
pub mod duration;
pub mod error;
pub mod extractor;
pub mod flac;
pub mod format;
pub mod id3v2;
pub mod lyrics;
pub mod model;
pub mod mp4;
pub mod text;

pub use cache::{CacheKey, LruMetadataCache, MetadataCache};
pub use duration::{probe_duration, DurationProbe};
pub use error::{MetadataError, Result};
pub use extractor::{parse, MetadataExtractor};
pub use format::{is_supported_file, AudioFormat};
pub use lyrics::{parse_lrc, LrcParseResult, SyncedLyricLine};
pub use model::{CoverArt, CoverImage, MetadataStatus, ParsedMetadata, PartialMetadata};

#[cfg(feature = "duration-probe")]
pub use duration::SymphoniaDurationProbe;
