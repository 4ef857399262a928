//! Format Dispatch and Metadata Extraction
//!
//! [`MetadataExtractor`] classifies an input into an [`AudioFormat`], runs the
//! matching container parser and merges the partial result with defaults so
//! callers always receive a complete [`ParsedMetadata`].
//!
//! ## Overview
//!
//! - `extract` is synchronous and pure: bytes in, metadata out, never fails
//! - `extract_with_duration` adds a bounded duration probe
//! - `extract_from_file` reads from disk and consults the result cache
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::MetadataExtractor;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = MetadataExtractor::new();
//! let metadata = extractor.extract_from_file(Path::new("song.mp3")).await?;
//!
//! println!("Title: {}", metadata.title);
//! println!("Duration: {}s", metadata.duration);
//! # Ok(())
//! # }
//! ```

use crate::artwork::placeholder_cover_url;
use crate::cache::{CacheKey, LruMetadataCache, MetadataCache};
use crate::duration::{probe_duration, DurationProbe};
use crate::error::{MetadataError, Result};
use crate::flac::parse_flac;
use crate::format::{file_stem, AudioFormat};
use crate::id3v2::parse_id3v2;
use crate::model::{CoverArt, ParsedMetadata, PartialMetadata};
use crate::mp4::parse_mp4;
use crate::text::sanitize_field;
use bytes::Bytes;
use core_runtime::config::{CoreConfig, ExtractionConfig};
use core_runtime::logging::strip_path;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const DEFAULT_ARTIST: &str = "Unknown Artist";
pub const DEFAULT_ALBUM: &str = "Unknown Album";

/// Runs the container parser for `format`.
pub fn parse_container(data: &[u8], format: AudioFormat, mp4_scan_limit: usize) -> PartialMetadata {
    match format {
        AudioFormat::Flac => parse_flac(data),
        AudioFormat::Mp3 => parse_id3v2(data),
        AudioFormat::M4a => parse_mp4(data, mp4_scan_limit),
        AudioFormat::Unknown => PartialMetadata::default(),
    }
}

/// Fills every field the parser left empty. Pure: no I/O, no failure.
pub fn merge_with_defaults(
    partial: PartialMetadata,
    file_name: &str,
    format: AudioFormat,
    config: &ExtractionConfig,
) -> ParsedMetadata {
    let status = partial.status();

    let cover = match partial.cover {
        Some(image) => CoverArt::Embedded(image),
        None => CoverArt::Placeholder {
            url: placeholder_cover_url(
                &config.placeholder_cover_base_url,
                file_name,
                config.placeholder_cover_size,
            ),
        },
    };

    ParsedMetadata {
        title: partial
            .title
            .unwrap_or_else(|| sanitize_field(&file_stem(file_name))),
        artist: partial.artist.unwrap_or_else(|| DEFAULT_ARTIST.to_string()),
        album: partial.album.unwrap_or_else(|| DEFAULT_ALBUM.to_string()),
        duration: 0.0,
        cover,
        lyrics: partial.lyrics.unwrap_or_default(),
        synced_lyrics: partial.synced_lyrics,
        format,
        status,
    }
}

/// Parses `data` with default settings. Never fails.
///
/// ```rust
/// let metadata = core_metadata::parse(&[], "Some Track.mp3");
/// assert_eq!(metadata.title, "Some Track");
/// assert_eq!(metadata.artist, "Unknown Artist");
/// assert!(metadata.cover.placeholder_url().is_some());
/// ```
pub fn parse(data: &[u8], file_name: &str) -> ParsedMetadata {
    MetadataExtractor::new().extract(data, file_name)
}

/// Metadata extractor wiring the parsers to an optional cache and duration
/// probe.
#[derive(Clone)]
pub struct MetadataExtractor {
    config: ExtractionConfig,
    cache: Option<Arc<dyn MetadataCache>>,
    duration_probe: Option<Arc<dyn DurationProbe>>,
}

impl MetadataExtractor {
    /// Default settings, no cache, bundled duration probe when compiled in.
    pub fn new() -> Self {
        Self {
            config: ExtractionConfig::default(),
            cache: None,
            duration_probe: default_probe(),
        }
    }

    /// Builds an extractor from validated configuration, including an LRU
    /// cache sized by `cache_capacity`.
    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        config.extraction.validate()?;

        let duration_probe = if config.extraction.duration_probe_enabled {
            default_probe()
        } else {
            None
        };

        Ok(Self {
            config: config.extraction.clone(),
            cache: Some(Arc::new(LruMetadataCache::new(config.extraction.cache_capacity))),
            duration_probe,
        })
    }

    pub fn with_cache(mut self, cache: Arc<dyn MetadataCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_duration_probe(mut self, probe: Arc<dyn DurationProbe>) -> Self {
        self.duration_probe = Some(probe);
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Synchronous extraction with defaults merged in; duration stays `0.0`.
    pub fn extract(&self, data: &[u8], file_name: &str) -> ParsedMetadata {
        let format = AudioFormat::detect(file_name, data);
        let partial = parse_container(data, format, self.config.mp4_scan_limit_bytes);
        let metadata = merge_with_defaults(partial, file_name, format, &self.config);

        debug!(
            file = %strip_path(file_name),
            ?format,
            missing = ?metadata.status.missing_fields(),
            "Extracted metadata"
        );

        metadata
    }

    /// [`extract`](Self::extract) plus a bounded duration probe.
    pub async fn extract_with_duration(&self, data: Bytes, file_name: &str) -> ParsedMetadata {
        let mut metadata = self.extract(&data, file_name);

        if self.config.duration_probe_enabled {
            if let Some(probe) = &self.duration_probe {
                metadata.duration = probe_duration(
                    probe.as_ref(),
                    data,
                    metadata.format,
                    self.config.duration_timeout(),
                )
                .await;
            }
        }

        metadata
    }

    /// Extraction of an in-memory buffer, cached by content digest.
    pub async fn extract_cached(&self, data: Bytes, file_name: &str) -> ParsedMetadata {
        let Some(cache) = self.cache.clone() else {
            return self.extract_with_duration(data, file_name).await;
        };

        let key = CacheKey::for_content(file_name, &data);
        if let Some(hit) = cache.get(&key) {
            return hit;
        }

        let metadata = self.extract_with_duration(data, file_name).await;
        cache.set(key, metadata.clone());
        metadata
    }

    /// Reads `path` and extracts its metadata, consulting the cache by
    /// name + size + modification time.
    ///
    /// # Errors
    ///
    /// - `FileNotFound` when `path` does not exist
    /// - `ExtractionFailed` when it cannot be read
    #[instrument(skip(self, path), fields(file = %strip_path(&path.to_string_lossy())))]
    pub async fn extract_from_file(&self, path: &Path) -> Result<ParsedMetadata> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        let fs_metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| read_error(path, e))?;
        let key = CacheKey::from_fs_metadata(file_name.as_str(), &fs_metadata);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                debug!("Metadata cache hit");
                return Ok(hit);
            }
        }

        let data = tokio::fs::read(path).await.map_err(|e| read_error(path, e))?;
        let metadata = self.extract_with_duration(Bytes::from(data), &file_name).await;

        if let Some(cache) = &self.cache {
            cache.set(key, metadata.clone());
        }

        Ok(metadata)
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetadataExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataExtractor")
            .field("config", &self.config)
            .field("cache", &self.cache.is_some())
            .field("duration_probe", &self.duration_probe.is_some())
            .finish()
    }
}

fn read_error(path: &Path, error: std::io::Error) -> MetadataError {
    if error.kind() == ErrorKind::NotFound {
        MetadataError::FileNotFound(path.display().to_string())
    } else {
        MetadataError::ExtractionFailed(format!("Failed to read file: {}", error))
    }
}

#[cfg(feature = "duration-probe")]
fn default_probe() -> Option<Arc<dyn DurationProbe>> {
    Some(Arc::new(crate::duration::SymphoniaDurationProbe::new()))
}

#[cfg(not(feature = "duration-probe"))]
fn default_probe() -> Option<Arc<dyn DurationProbe>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagless_container_is_empty() {
        let flac = b"fLaC\x84\x00\x00\x00";
        assert!(parse_container(flac, AudioFormat::Flac, 1024).is_empty());
        assert!(parse_container(flac, AudioFormat::Unknown, 1024).is_empty());
    }

    #[test]
    fn test_defaults() {
        let metadata = parse(b"", "Track 01.flac");
        assert_eq!(metadata.title, "Track 01");
        assert_eq!(metadata.artist, DEFAULT_ARTIST);
        assert_eq!(metadata.album, DEFAULT_ALBUM);
        assert_eq!(metadata.lyrics, "");
        assert!(metadata.synced_lyrics.is_none());
        assert_eq!(metadata.duration, 0.0);
        assert_eq!(metadata.format, AudioFormat::Flac);
        assert_eq!(
            metadata.cover.placeholder_url(),
            Some("https://picsum.photos/seed/Track%2001.flac/300/300")
        );
        assert_eq!(metadata.status, Default::default());
    }

    #[test]
    fn test_merge_uses_configured_placeholder() {
        let config = ExtractionConfig {
            placeholder_cover_base_url: "https://covers.example".into(),
            placeholder_cover_size: 64,
            ..ExtractionConfig::default()
        };
        let metadata = merge_with_defaults(PartialMetadata::default(), "x.mp3", AudioFormat::Mp3, &config);
        assert_eq!(
            metadata.cover.placeholder_url(),
            Some("https://covers.example/x.mp3/64/64")
        );
    }

    #[test]
    fn test_merge_keeps_parsed_fields() {
        let mut partial = PartialMetadata::default();
        partial.set_artist("Someone");
        let metadata = merge_with_defaults(partial, "song.mp3", AudioFormat::Mp3, &ExtractionConfig::default());
        assert_eq!(metadata.title, "song");
        assert_eq!(metadata.artist, "Someone");
        assert!(metadata.status.has_artist);
        assert!(!metadata.status.has_title);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut config = CoreConfig::default();
        config.extraction.cache_capacity = 0;
        let err = MetadataExtractor::from_config(&config).unwrap_err();
        assert!(matches!(err, MetadataError::Config(_)));
    }

    #[test]
    fn test_from_config_without_probe() {
        let config = CoreConfig::builder()
            .duration_probe_enabled(false)
            .build()
            .unwrap();
        let extractor = MetadataExtractor::from_config(&config).unwrap();
        assert!(!extractor.config().duration_probe_enabled);
        assert!(format!("{extractor:?}").contains("duration_probe: false"));
    }
}
