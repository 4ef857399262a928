//! # LRC Lyrics Module
//!
//! Parses lyric blobs that follow the LRC convention (`[mm:ss.xx]text`) into a
//! time-ordered list of synced lines plus a plain-text rendition with all
//! timestamps stripped.
//!
//! ## Supported tags
//!
//! - `[mm:ss]`, `[mm:ss.x]`, `[mm:ss.xx]`, `[mm:ss.xxx]`
//! - `[hh:mm:ss]` (three colon-separated groups)
//! - several stacked timestamps on one line (`[00:10.00][01:10.00]Chorus`)
//!   fan out into one entry per timestamp
//! - ID tags on their own line (`[ar:...]`, `[ti:...]`, `[offset:+250]`, ...)
//!   are kept out of the plain text; `offset` shifts every timestamp
//!
//! ## Usage
//!
//! ```
//! use core_metadata::lyrics::parse_lrc;
//!
//! let parsed = parse_lrc("[00:01.00]Hello\n[00:02.50]World");
//! assert_eq!(parsed.plain_text, "Hello\nWorld");
//!
//! let synced = parsed.synced_lyrics.unwrap();
//! assert_eq!(synced[1].time, 2.5);
//! assert_eq!(synced[1].text, "World");
//! ```

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Residual text LRC files use to mark an instrumental break.
const INSTRUMENTAL_MARKER: &str = "//";

/// One timed lyric line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedLyricLine {
    /// Start time in seconds
    pub time: f64,
    /// Line text (never empty)
    pub text: String,
}

impl SyncedLyricLine {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }
}

/// Output of [`parse_lrc`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LrcParseResult {
    /// Residual lines (timestamps stripped) joined with `\n`
    pub plain_text: String,
    /// Synced lines sorted by time; `None` when no timestamp was found
    pub synced_lyrics: Option<Vec<SyncedLyricLine>>,
}

impl LrcParseResult {
    pub fn is_synced(&self) -> bool {
        self.synced_lyrics.is_some()
    }
}

fn timestamp_regex() -> &'static Regex {
    static TIMESTAMP: OnceLock<Regex> = OnceLock::new();
    TIMESTAMP.get_or_init(|| {
        Regex::new(r"\[(\d+):(\d{1,2})(?::(\d{1,2}))?(?:\.(\d{1,3}))?\]")
            .expect("timestamp pattern is valid")
    })
}

fn id_tag_regex() -> &'static Regex {
    static ID_TAG: OnceLock<Regex> = OnceLock::new();
    ID_TAG.get_or_init(|| {
        Regex::new(r"(?i)^\[(ti|ar|al|au|by|re|ve|length|offset|tool|#):(.*)\]$")
            .expect("id tag pattern is valid")
    })
}

/// Returns true when `text` contains at least one LRC timestamp.
pub fn looks_like_lrc(text: &str) -> bool {
    timestamp_regex().is_match(text)
}

/// Parses an LRC blob.
///
/// Lines without timestamps still contribute to `plain_text`, so ordinary
/// unsynced lyrics pass through unchanged.
pub fn parse_lrc(input: &str) -> LrcParseResult {
    let timestamp = timestamp_regex();
    let mut plain_lines: Vec<String> = Vec::new();
    let mut synced: Vec<SyncedLyricLine> = Vec::new();
    let mut offset_ms: i64 = 0;

    for raw_line in input.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = id_tag_regex().captures(line) {
            if caps[1].eq_ignore_ascii_case("offset") {
                offset_ms = caps[2].trim().trim_start_matches('+').parse().unwrap_or(0);
            }
            continue;
        }

        let times: Vec<f64> = timestamp
            .captures_iter(line)
            .filter_map(|c| capture_seconds(&c))
            .collect();
        let residual = timestamp.replace_all(line, "");
        let residual = residual.trim();

        if residual.is_empty() || residual == INSTRUMENTAL_MARKER {
            continue;
        }

        plain_lines.push(residual.to_string());
        synced.extend(times.into_iter().map(|time| SyncedLyricLine::new(time, residual)));
    }

    if offset_ms != 0 {
        let shift = offset_ms as f64 / 1000.0;
        for line in &mut synced {
            line.time = (line.time - shift).max(0.0);
        }
    }

    // Stable: lines sharing a timestamp keep their file order
    synced.sort_by(|a, b| a.time.total_cmp(&b.time));

    LrcParseResult {
        plain_text: plain_lines.join("\n"),
        synced_lyrics: if synced.is_empty() { None } else { Some(synced) },
    }
}

/// Timestamp value in seconds, or `None` when it is too large to represent.
///
/// Groups are summed as `f64` so arbitrarily long digit runs cannot overflow.
fn capture_seconds(caps: &Captures<'_>) -> Option<f64> {
    let group = |idx: usize| -> f64 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };

    let fraction = caps
        .get(4)
        .map(|m| {
            let padded = format!("{:0<3}", m.as_str());
            padded.parse::<u32>().unwrap_or(0) as f64 / 1000.0
        })
        .unwrap_or(0.0);

    let seconds = if caps.get(3).is_some() {
        // [hh:mm:ss]
        group(1) * 3600.0 + group(2) * 60.0 + group(3) + fraction
    } else {
        group(1) * 60.0 + group(2) + fraction
    };

    seconds.is_finite().then_some(seconds)
}

/// Formats seconds as an `[mm:ss.xx]` tag.
pub fn format_timestamp(seconds: f64) -> String {
    let centis = (seconds.max(0.0) * 100.0).round() as u64;
    format!(
        "[{:02}:{:02}.{:02}]",
        centis / 6000,
        (centis / 100) % 60,
        centis % 100
    )
}

/// Renders synced lines back into LRC text, one line per entry.
pub fn format_lrc(lines: &[SyncedLyricLine]) -> String {
    lines
        .iter()
        .map(|line| format!("{}{}", format_timestamp(line.time), line.text))
        .collect::<Vec<_>>()
        .join("\n")
}
