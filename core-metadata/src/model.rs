//! Metadata types produced by the container parsers and the extractor.

use crate::format::AudioFormat;
use crate::lyrics::{LrcParseResult, SyncedLyricLine};
use crate::text::{sanitize_field, sanitize_multiline};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Embedded picture bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImage {
    pub data: Bytes,
    pub mime_type: String,
}

impl CoverImage {
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// SHA-256 of the image bytes (hex), for deduplicating stored covers.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.data);
        format!("{:x}", hasher.finalize())
    }
}

/// Cover carried by a merged result: always displayable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CoverArt {
    Embedded(CoverImage),
    Placeholder { url: String },
}

impl CoverArt {
    pub fn as_embedded(&self) -> Option<&CoverImage> {
        match self {
            Self::Embedded(image) => Some(image),
            Self::Placeholder { .. } => None,
        }
    }

    pub fn placeholder_url(&self) -> Option<&str> {
        match self {
            Self::Embedded(_) => None,
            Self::Placeholder { url } => Some(url),
        }
    }
}

/// Fields a single container parser recovered. Anything `None` is filled
/// with a default by the extractor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub lyrics: Option<String>,
    pub synced_lyrics: Option<Vec<SyncedLyricLine>>,
    pub cover: Option<CoverImage>,
}

impl PartialMetadata {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn set_title(&mut self, value: &str) {
        fill_field(&mut self.title, value);
    }

    pub fn set_artist(&mut self, value: &str) {
        fill_field(&mut self.artist, value);
    }

    pub fn set_album(&mut self, value: &str) {
        fill_field(&mut self.album, value);
    }

    /// Records parsed lyrics.
    ///
    /// Takes the new lyrics when none are set yet, or when they carry timing
    /// and the current ones do not.
    pub fn apply_lyrics(&mut self, parsed: LrcParseResult) {
        let plain = sanitize_multiline(&parsed.plain_text);
        let synced = parsed.synced_lyrics.and_then(sanitize_synced);

        if plain.is_empty() && synced.is_none() {
            return;
        }

        let upgrade = synced.is_some() && self.synced_lyrics.is_none();
        if self.lyrics.is_none() || upgrade {
            self.lyrics = Some(plain);
            self.synced_lyrics = synced;
        }
    }

    /// Records timed lines from a dedicated synced-lyrics source.
    ///
    /// These replace any timing recovered from LRC text; the plain lyrics are
    /// only derived from them when no plain text was found.
    pub fn apply_synced_lines(&mut self, mut lines: Vec<SyncedLyricLine>) {
        lines.sort_by(|a, b| a.time.total_cmp(&b.time));
        let Some(lines) = sanitize_synced(lines) else {
            return;
        };

        if self.lyrics.as_deref().map_or(true, str::is_empty) {
            let plain = lines
                .iter()
                .map(|line| line.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            self.lyrics = Some(plain);
        }
        self.synced_lyrics = Some(lines);
    }

    /// Records a cover unless one is already set.
    pub fn set_cover(&mut self, cover: CoverImage) {
        if self.cover.is_none() && !cover.is_empty() {
            self.cover = Some(cover);
        }
    }

    pub fn status(&self) -> MetadataStatus {
        MetadataStatus {
            has_title: self.title.is_some(),
            has_artist: self.artist.is_some(),
            has_album: self.album.is_some(),
            has_lyrics: self.lyrics.as_deref().is_some_and(|l| !l.is_empty()),
            has_synced_lyrics: self.synced_lyrics.is_some(),
            has_embedded_cover: self.cover.is_some(),
        }
    }
}

fn fill_field(slot: &mut Option<String>, value: &str) {
    if slot.is_some() {
        return;
    }
    let value = sanitize_field(value);
    if !value.is_empty() {
        *slot = Some(value);
    }
}

fn sanitize_synced(lines: Vec<SyncedLyricLine>) -> Option<Vec<SyncedLyricLine>> {
    let lines: Vec<SyncedLyricLine> = lines
        .into_iter()
        .map(|line| SyncedLyricLine::new(line.time, sanitize_field(&line.text)))
        .filter(|line| !line.text.is_empty())
        .collect();
    (!lines.is_empty()).then_some(lines)
}

/// Which fields came from the file rather than from defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataStatus {
    pub has_title: bool,
    pub has_artist: bool,
    pub has_album: bool,
    pub has_lyrics: bool,
    pub has_synced_lyrics: bool,
    pub has_embedded_cover: bool,
}

impl MetadataStatus {
    /// True when every field was recovered from the file.
    pub fn is_complete(&self) -> bool {
        self.has_title && self.has_artist && self.has_album && self.has_lyrics && self.has_embedded_cover
    }

    /// Names of the fields that fell back to defaults.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            (self.has_title, "title"),
            (self.has_artist, "artist"),
            (self.has_album, "album"),
            (self.has_lyrics, "lyrics"),
            (self.has_embedded_cover, "cover"),
        ]
        .into_iter()
        .filter_map(|(present, name)| (!present).then_some(name))
        .collect()
    }
}

/// Unified extraction result handed to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Seconds; `0.0` when unknown
    pub duration: f64,
    pub cover: CoverArt,
    pub lyrics: String,
    pub synced_lyrics: Option<Vec<SyncedLyricLine>>,
    pub format: AudioFormat,
    pub status: MetadataStatus,
}

impl ParsedMetadata {
    pub fn cover_image(&self) -> Option<&CoverImage> {
        self.cover.as_embedded()
    }

    pub fn has_synced_lyrics(&self) -> bool {
        self.synced_lyrics.is_some()
    }
}
