//! Extracts metadata from audio files and prints it as JSON.
//!
//! Run with:
//! ```bash
//! cargo run -p core-metadata --example extract_file -- song.flac other.mp3
//!
//! # JSON logs with parser tracing
//! cargo run -p core-metadata --example extract_file -- --json song.mp3
//! ```

use core_metadata::{is_supported_file, MetadataExtractor};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::env;
use std::path::Path;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let mut args: Vec<String> = env::args().skip(1).collect();

    let format = if args.first().map(String::as_str) == Some("--json") {
        args.remove(0);
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };

    let config = CoreConfig::builder()
        .logging(
            LoggingConfig::default()
                .with_format(format)
                .with_level(LogLevel::Debug),
        )
        .build()
        .expect("default configuration is valid");

    init_logging(config.logging.clone()).expect("Failed to initialize logging");

    let extractor = match MetadataExtractor::from_config(&config) {
        Ok(extractor) => extractor,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return;
        }
    };

    if args.is_empty() {
        warn!("No input files given");
        return;
    }

    for arg in &args {
        let path = Path::new(arg);
        if !is_supported_file(arg) {
            warn!(file = %arg, "Unsupported extension, defaults only");
        }

        match extractor.extract_from_file(path).await {
            Ok(metadata) => {
                info!(
                    title = %metadata.title,
                    duration = metadata.duration,
                    missing = ?metadata.status.missing_fields(),
                    "Extracted"
                );
                match serde_json::to_string_pretty(&metadata) {
                    Ok(json) => println!("{json}"),
                    Err(e) => error!(error = %e, "Failed to serialize metadata"),
                }
            }
            Err(e) => error!(file = %arg, error = %e, "Extraction failed"),
        }
    }
}
