//! # Core Configuration Module
//!
//! Provides configuration management for the metadata extraction core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the extraction settings and the logging setup. The
//! builder validates everything in [`build()`](CoreConfigBuilder::build) so a
//! misconfigured host fails fast at startup instead of mid-import.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::{CoreConfig, ExtractionConfig};
//!
//! let config = CoreConfig::builder()
//!     .mp4_scan_limit_bytes(4 * 1024 * 1024)
//!     .duration_timeout_ms(5_000)
//!     .cache_capacity(512)
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.extraction.cache_capacity, 512);
//! ```
//!
//! `ExtractionConfig` is serde-friendly, so hosts can also ship it as JSON:
//!
//! ```
//! use core_runtime::config::ExtractionConfig;
//!
//! let config: ExtractionConfig =
//!     serde_json::from_str(r#"{ "duration_probe_enabled": false }"#).unwrap();
//! assert!(!config.duration_probe_enabled);
//! assert_eq!(config.mp4_scan_limit_bytes, 10 * 1024 * 1024);
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default bound on how far into an MP4 buffer the atom walker may look.
pub const DEFAULT_MP4_SCAN_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Default bounded wait for the duration probe.
pub const DEFAULT_DURATION_TIMEOUT_MS: u64 = 8_000;

/// Default number of parsed results kept by the in-memory cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Default seeded placeholder-image service.
pub const DEFAULT_PLACEHOLDER_COVER_BASE_URL: &str = "https://picsum.photos/seed";

/// Default placeholder edge length in pixels.
pub const DEFAULT_PLACEHOLDER_COVER_SIZE: u32 = 300;

const MAX_DURATION_TIMEOUT_MS: u64 = 5 * 60 * 1000;

/// Core configuration for the metadata core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Debug, Clone, Default)]
pub struct CoreConfig {
    /// Settings for the parsing pipeline
    pub extraction: ExtractionConfig,

    /// Logging setup handed to [`crate::logging::init_logging`]
    pub logging: LoggingConfig,
}

/// Settings consumed by the metadata extraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Upper bound (bytes) for the MP4 cover-atom search
    pub mp4_scan_limit_bytes: usize,

    /// Whether the extractor measures duration with the media probe
    pub duration_probe_enabled: bool,

    /// Bounded wait for the duration probe, in milliseconds
    pub duration_timeout_ms: u64,

    /// Number of entries kept by the default LRU result cache
    pub cache_capacity: usize,

    /// Base URL of the seeded placeholder-image service
    pub placeholder_cover_base_url: String,

    /// Placeholder image edge length in pixels
    pub placeholder_cover_size: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            mp4_scan_limit_bytes: DEFAULT_MP4_SCAN_LIMIT_BYTES,
            duration_probe_enabled: true,
            duration_timeout_ms: DEFAULT_DURATION_TIMEOUT_MS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            placeholder_cover_base_url: DEFAULT_PLACEHOLDER_COVER_BASE_URL.to_string(),
            placeholder_cover_size: DEFAULT_PLACEHOLDER_COVER_SIZE,
        }
    }
}

impl ExtractionConfig {
    /// Duration probe timeout as a [`Duration`]
    pub fn duration_timeout(&self) -> Duration {
        Duration::from_millis(self.duration_timeout_ms)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.mp4_scan_limit_bytes == 0 {
            return Err(Error::Config(
                "MP4 scan limit must be greater than 0 bytes".to_string(),
            ));
        }

        if self.duration_timeout_ms == 0 {
            return Err(Error::Config(
                "Duration probe timeout must be greater than 0ms".to_string(),
            ));
        }

        if self.duration_timeout_ms > MAX_DURATION_TIMEOUT_MS {
            return Err(Error::Config(
                "Duration probe timeout exceeds maximum of 5 minutes (300,000ms)".to_string(),
            ));
        }

        if self.cache_capacity == 0 {
            return Err(Error::Config(
                "Cache capacity must be at least 1 entry".to_string(),
            ));
        }

        let base = self.placeholder_cover_base_url.trim();
        if base.is_empty() {
            return Err(Error::Config(
                "Placeholder cover base URL cannot be empty".to_string(),
            ));
        }
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(Error::Config(format!(
                "Placeholder cover base URL must be http(s): {}",
                base
            )));
        }

        if self.placeholder_cover_size == 0 {
            return Err(Error::Config(
                "Placeholder cover size must be greater than 0 pixels".to_string(),
            ));
        }

        Ok(())
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        self.extraction.validate()
    }
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Unset values fall back to the [`ExtractionConfig`] defaults.
#[derive(Debug, Default)]
pub struct CoreConfigBuilder {
    extraction: Option<ExtractionConfig>,
    mp4_scan_limit_bytes: Option<usize>,
    duration_probe_enabled: Option<bool>,
    duration_timeout_ms: Option<u64>,
    cache_capacity: Option<usize>,
    placeholder_cover_base_url: Option<String>,
    placeholder_cover_size: Option<u32>,
    logging: Option<LoggingConfig>,
}

impl CoreConfigBuilder {
    /// Starts from a complete extraction config (e.g. one loaded from JSON).
    ///
    /// Individual setters called afterwards still override its fields.
    pub fn extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.extraction = Some(extraction);
        self
    }

    /// Sets the MP4 cover-search bound in bytes.
    pub fn mp4_scan_limit_bytes(mut self, limit: usize) -> Self {
        self.mp4_scan_limit_bytes = Some(limit);
        self
    }

    /// Enables or disables duration probing.
    pub fn duration_probe_enabled(mut self, enabled: bool) -> Self {
        self.duration_probe_enabled = Some(enabled);
        self
    }

    /// Sets the duration probe timeout in milliseconds.
    pub fn duration_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.duration_timeout_ms = Some(timeout_ms);
        self
    }

    /// Sets the number of entries kept by the result cache.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Sets the placeholder-image service base URL.
    pub fn placeholder_cover_base_url(mut self, url: impl Into<String>) -> Self {
        self.placeholder_cover_base_url = Some(url.into());
        self
    }

    /// Sets the placeholder image edge length.
    pub fn placeholder_cover_size(mut self, size: u32) -> Self {
        self.placeholder_cover_size = Some(size);
        self
    }

    /// Sets the logging configuration.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] with an actionable message when any value is
    /// out of range.
    pub fn build(self) -> Result<CoreConfig> {
        let mut extraction = self.extraction.unwrap_or_default();

        if let Some(limit) = self.mp4_scan_limit_bytes {
            extraction.mp4_scan_limit_bytes = limit;
        }
        if let Some(enabled) = self.duration_probe_enabled {
            extraction.duration_probe_enabled = enabled;
        }
        if let Some(timeout_ms) = self.duration_timeout_ms {
            extraction.duration_timeout_ms = timeout_ms;
        }
        if let Some(capacity) = self.cache_capacity {
            extraction.cache_capacity = capacity;
        }
        if let Some(url) = self.placeholder_cover_base_url {
            extraction.placeholder_cover_base_url = url;
        }
        if let Some(size) = self.placeholder_cover_size {
            extraction.placeholder_cover_size = size;
        }

        let config = CoreConfig {
            extraction,
            logging: self.logging.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogFormat, LogLevel};

    #[test]
    fn test_default_config_is_valid() {
        let config = CoreConfig::builder().build().unwrap();
        assert_eq!(config.extraction, ExtractionConfig::default());
        assert_eq!(
            config.extraction.mp4_scan_limit_bytes,
            DEFAULT_MP4_SCAN_LIMIT_BYTES
        );
        assert!(config.extraction.duration_probe_enabled);
    }

    #[test]
    fn test_builder_overrides() {
        let config = CoreConfig::builder()
            .mp4_scan_limit_bytes(1024)
            .duration_probe_enabled(false)
            .duration_timeout_ms(250)
            .cache_capacity(3)
            .placeholder_cover_base_url("https://covers.example.com/seed")
            .placeholder_cover_size(64)
            .logging(LoggingConfig::default().with_format(LogFormat::Compact))
            .build()
            .unwrap();

        assert_eq!(config.extraction.mp4_scan_limit_bytes, 1024);
        assert!(!config.extraction.duration_probe_enabled);
        assert_eq!(config.extraction.duration_timeout(), Duration::from_millis(250));
        assert_eq!(config.extraction.cache_capacity, 3);
        assert_eq!(
            config.extraction.placeholder_cover_base_url,
            "https://covers.example.com/seed"
        );
        assert_eq!(config.extraction.placeholder_cover_size, 64);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_setters_override_base_extraction() {
        let base = ExtractionConfig {
            cache_capacity: 10,
            ..ExtractionConfig::default()
        };
        let config = CoreConfig::builder()
            .extraction(base)
            .cache_capacity(20)
            .build()
            .unwrap();
        assert_eq!(config.extraction.cache_capacity, 20);
    }

    #[test]
    fn test_rejects_zero_scan_limit() {
        let err = CoreConfig::builder()
            .mp4_scan_limit_bytes(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("MP4 scan limit"));
    }

    #[test]
    fn test_rejects_bad_timeouts() {
        assert!(CoreConfig::builder().duration_timeout_ms(0).build().is_err());
        assert!(CoreConfig::builder()
            .duration_timeout_ms(MAX_DURATION_TIMEOUT_MS + 1)
            .build()
            .is_err());
    }

    #[test]
    fn test_rejects_zero_capacity() {
        assert!(CoreConfig::builder().cache_capacity(0).build().is_err());
    }

    #[test]
    fn test_rejects_bad_placeholder_url() {
        assert!(CoreConfig::builder()
            .placeholder_cover_base_url("")
            .build()
            .is_err());
        assert!(CoreConfig::builder()
            .placeholder_cover_base_url("ftp://example.com")
            .build()
            .is_err());
        assert!(CoreConfig::builder().placeholder_cover_size(0).build().is_err());
    }

    #[test]
    fn test_extraction_config_from_partial_json() {
        let config: ExtractionConfig =
            serde_json::from_str(r#"{ "cache_capacity": 8, "duration_timeout_ms": 1000 }"#)
                .unwrap();
        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.duration_timeout_ms, 1000);
        assert_eq!(
            config.placeholder_cover_base_url,
            DEFAULT_PLACEHOLDER_COVER_BASE_URL
        );
        assert!(config.validate().is_ok());
    }
}
