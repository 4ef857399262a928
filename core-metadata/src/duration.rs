//! # Duration Probe
//!
//! Track length comes from a media facility, not from tag parsing. The probe
//! is a trait so hosts can plug in whatever decoder they already have; the
//! bundled [`SymphoniaDurationProbe`] reads container headers with Symphonia.
//!
//! Every probe runs under a deadline. [`probe_duration`] turns errors and
//! timeouts into `0.0` so a corrupt file never stalls or fails an import.

use crate::error::{MetadataError, Result};
use crate::format::AudioFormat;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::{debug, warn};

/// Measures the playback length of an in-memory audio file.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn probe(&self, data: Bytes, format: AudioFormat) -> Result<Duration>;
}

/// Runs `probe` with a deadline.
pub async fn probe_with_timeout(
    probe: &dyn DurationProbe,
    data: Bytes,
    format: AudioFormat,
    timeout: Duration,
) -> Result<Duration> {
    tokio::time::timeout(timeout, probe.probe(data, format))
        .await
        .map_err(|_| MetadataError::Timeout(timeout))?
}

/// Duration in seconds, or `0.0` when the probe fails or times out.
pub async fn probe_duration(
    probe: &dyn DurationProbe,
    data: Bytes,
    format: AudioFormat,
    timeout: Duration,
) -> f64 {
    match probe_with_timeout(probe, data, format, timeout).await {
        Ok(duration) => duration.as_secs_f64(),
        Err(MetadataError::Timeout(limit)) => {
            warn!(?limit, ?format, "Duration probe timed out");
            0.0
        }
        Err(e) => {
            debug!(error = %e, ?format, "Duration probe failed");
            0.0
        }
    }
}

#[cfg(feature = "duration-probe")]
pub use self::symphonia_probe::SymphoniaDurationProbe;

#[cfg(feature = "duration-probe")]
mod symphonia_probe {
    use super::*;
    use std::io::Cursor;
    use symphonia::core::codecs::CODEC_TYPE_NULL;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::{MediaSource, MediaSourceStream};
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;
    use tracing::instrument;

    /// Probes container headers with Symphonia on the blocking pool.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SymphoniaDurationProbe;

    impl SymphoniaDurationProbe {
        pub fn new() -> Self {
            Self
        }

        /// Synchronous probe: `n_frames / sample_rate` of the first real track.
        pub fn probe_blocking(data: &[u8], format: AudioFormat) -> Result<Duration> {
            let mut hint = Hint::new();
            if let Some(extension) = format.extension() {
                hint.with_extension(extension);
            }

            let cursor = Cursor::new(data.to_vec());
            let media_source = Box::new(cursor) as Box<dyn MediaSource>;
            let mss = MediaSourceStream::new(media_source, Default::default());

            let probed = symphonia::default::get_probe()
                .format(
                    &hint,
                    mss,
                    &FormatOptions::default(),
                    &MetadataOptions::default(),
                )
                .map_err(|e| MetadataError::DurationProbe(format!("Failed to probe format: {}", e)))?;

            let track = probed
                .format
                .tracks()
                .iter()
                .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
                .ok_or_else(|| MetadataError::DurationProbe("No audio track".to_string()))?;

            let sample_rate = track
                .codec_params
                .sample_rate
                .filter(|rate| *rate > 0)
                .ok_or_else(|| MetadataError::DurationProbe("Missing sample rate".to_string()))?;
            let frames = track
                .codec_params
                .n_frames
                .ok_or_else(|| MetadataError::DurationProbe("Unknown frame count".to_string()))?;

            let duration = Duration::from_secs_f64(frames as f64 / sample_rate as f64);
            debug!(?duration, sample_rate, frames, "Probed track duration");
            Ok(duration)
        }
    }

    #[async_trait]
    impl DurationProbe for SymphoniaDurationProbe {
        #[instrument(skip(self, data), fields(len = data.len()))]
        async fn probe(&self, data: Bytes, format: AudioFormat) -> Result<Duration> {
            tokio::task::spawn_blocking(move || Self::probe_blocking(&data, format))
                .await
                .map_err(|e| MetadataError::DurationProbe(format!("Probe task failed: {}", e)))?
        }
    }
}
