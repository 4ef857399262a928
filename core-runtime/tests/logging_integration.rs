//! Integration tests for logging and configuration wiring

use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, strip_path, LogFormat, LogLevel, LoggingConfig};

#[test]
fn test_logging_initialization_once() {
    // Only one global subscriber per process: the first init wins
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug);

    assert!(init_logging(config.clone()).is_ok());
    tracing::debug!(target: "core_metadata", file = %strip_path("/tmp/song.flac"), "parsed");

    let err = init_logging(config).unwrap_err();
    assert!(err.to_string().contains("Failed to initialize logging"));
}

#[test]
fn test_core_config_carries_logging() {
    let config = CoreConfig::builder()
        .logging(
            LoggingConfig::default()
                .with_level(LogLevel::Warn)
                .with_filter("core_metadata=trace"),
        )
        .build()
        .unwrap();

    assert_eq!(config.logging.level, LogLevel::Warn);
    assert_eq!(config.logging.filter.as_deref(), Some("core_metadata=trace"));
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/music/library/Artist - Song.mp3"), "Artist - Song.mp3");
    assert_eq!(strip_path("D:\\Music\\track.flac"), "track.flac");
}
