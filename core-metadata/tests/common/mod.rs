//! Byte-level fixture builders shared by the integration tests.
//!
//! Fixtures are synthesized in memory so every test documents exactly which
//! bytes it feeds the parsers.

#![allow(dead_code)]

use core_metadata::binary::encode_synchsafe;
use std::path::PathBuf;

/// Scratch directory for tests that need real files.
pub fn fixtures_dir() -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures");
    std::fs::create_dir_all(&dir).expect("create fixtures dir");
    dir
}

// ============================================================================
// FLAC
// ============================================================================

pub struct FlacBuilder {
    blocks: Vec<(u8, Vec<u8>)>,
}

impl FlacBuilder {
    pub fn new() -> Self {
        // Every real FLAC starts with STREAMINFO
        Self {
            blocks: vec![(0, vec![0u8; 34])],
        }
    }

    pub fn vorbis_comment(mut self, comments: &[&str]) -> Self {
        let vendor = b"reference libFLAC 1.4.3";
        let mut out = Vec::new();
        out.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
        out.extend_from_slice(vendor);
        out.extend_from_slice(&(comments.len() as u32).to_le_bytes());
        for comment in comments {
            out.extend_from_slice(&(comment.len() as u32).to_le_bytes());
            out.extend_from_slice(comment.as_bytes());
        }
        self.blocks.push((4, out));
        self
    }

    pub fn picture(mut self, mime: &str, image: &[u8]) -> Self {
        let mut out = Vec::new();
        out.extend_from_slice(&3u32.to_be_bytes());
        out.extend_from_slice(&(mime.len() as u32).to_be_bytes());
        out.extend_from_slice(mime.as_bytes());
        let description = b"Front";
        out.extend_from_slice(&(description.len() as u32).to_be_bytes());
        out.extend_from_slice(description);
        for value in [500u32, 500, 24, 0] {
            out.extend_from_slice(&value.to_be_bytes());
        }
        out.extend_from_slice(&(image.len() as u32).to_be_bytes());
        out.extend_from_slice(image);
        self.blocks.push((6, out));
        self
    }

    pub fn padding(mut self, len: usize) -> Self {
        self.blocks.push((1, vec![0u8; len]));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = b"fLaC".to_vec();
        let last = self.blocks.len().saturating_sub(1);
        for (idx, (block_type, payload)) in self.blocks.into_iter().enumerate() {
            let flag = if idx == last { 0x80 } else { 0 };
            out.push(flag | block_type);
            out.extend_from_slice(&(payload.len() as u32).to_be_bytes()[1..]);
            out.extend_from_slice(&payload);
        }
        // A few bytes standing in for the first audio frame
        out.extend_from_slice(&[0xFF, 0xF8, 0x69, 0x08]);
        out
    }
}

// ============================================================================
// ID3v2
// ============================================================================

pub struct Id3Builder {
    version: u8,
    frames: Vec<u8>,
    padding: usize,
}

impl Id3Builder {
    pub fn v3() -> Self {
        Self::new(3)
    }

    pub fn v4() -> Self {
        Self::new(4)
    }

    pub fn new(version: u8) -> Self {
        Self {
            version,
            frames: Vec::new(),
            padding: 0,
        }
    }

    /// Appends a frame with a size field encoded for this tag's version.
    pub fn frame(self, id: &[u8; 4], payload: &[u8]) -> Self {
        let size = payload.len() as u32;
        let size = if self.version >= 4 { encode_synchsafe(size) } else { size };
        self.raw_frame(id, size, payload)
    }

    /// Appends a frame with a caller-chosen size field.
    pub fn raw_frame(mut self, id: &[u8; 4], size_field: u32, payload: &[u8]) -> Self {
        self.frames.extend_from_slice(id);
        self.frames.extend_from_slice(&size_field.to_be_bytes());
        self.frames.extend_from_slice(&[0, 0]);
        self.frames.extend_from_slice(payload);
        self
    }

    /// UTF-8 text frame.
    pub fn text(self, id: &[u8; 4], value: &str) -> Self {
        let mut payload = vec![3u8];
        payload.extend_from_slice(value.as_bytes());
        self.frame(id, &payload)
    }

    pub fn uslt(self, lyrics: &str) -> Self {
        let mut payload = vec![3u8];
        payload.extend_from_slice(b"eng");
        payload.push(0);
        payload.extend_from_slice(lyrics.as_bytes());
        self.frame(b"USLT", &payload)
    }

    pub fn sylt(self, entries: &[(&str, u32)]) -> Self {
        let mut payload = vec![3u8];
        payload.extend_from_slice(b"eng");
        payload.push(2); // milliseconds
        payload.push(1); // lyrics
        payload.extend_from_slice(b"desc\0");
        for (text, ms) in entries {
            payload.extend_from_slice(text.as_bytes());
            payload.push(0);
            payload.extend_from_slice(&ms.to_be_bytes());
        }
        self.frame(b"SYLT", &payload)
    }

    pub fn apic(self, mime: &str, picture_type: u8, image: &[u8]) -> Self {
        let mut payload = vec![0u8];
        payload.extend_from_slice(mime.as_bytes());
        payload.push(0);
        payload.push(picture_type);
        payload.extend_from_slice(b"cover\0");
        payload.extend_from_slice(image);
        self.frame(b"APIC", &payload)
    }

    pub fn padding(mut self, len: usize) -> Self {
        self.padding = len;
        self
    }

    /// Tag followed by a stand-in MPEG frame header.
    pub fn build(self) -> Vec<u8> {
        let body_len = self.frames.len() + self.padding;
        let mut out = b"ID3".to_vec();
        out.extend_from_slice(&[self.version, 0, 0]);
        out.extend_from_slice(&encode_synchsafe(body_len as u32).to_be_bytes());
        out.extend_from_slice(&self.frames);
        out.resize(out.len() + self.padding, 0);
        out.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x64]);
        out
    }
}

// ============================================================================
// MP4
// ============================================================================

pub fn atom(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

/// `ftyp` + `moov/udta/meta/ilst/covr/data` carrying one picture.
pub fn m4a_with_cover(data_type: u32, image: &[u8]) -> Vec<u8> {
    let mut data_body = data_type.to_be_bytes().to_vec();
    data_body.extend_from_slice(&[0u8; 4]);
    data_body.extend_from_slice(image);

    let title = {
        let mut body = 1u32.to_be_bytes().to_vec();
        body.extend_from_slice(&[0u8; 4]);
        body.extend_from_slice(b"Ignored Title");
        atom(b"\xa9nam", &atom(b"data", &body))
    };
    let ilst = atom(b"ilst", &[title, atom(b"covr", &atom(b"data", &data_body))].concat());

    let mut meta_body = vec![0u8; 4];
    meta_body.extend_from_slice(&atom(b"hdlr", &[0u8; 25]));
    meta_body.extend_from_slice(&ilst);

    let moov = atom(
        b"moov",
        &[
            atom(b"mvhd", &[0u8; 100]),
            atom(b"udta", &atom(b"meta", &meta_body)),
        ]
        .concat(),
    );

    [atom(b"ftyp", b"M4A \0\0\0\0isomM4A "), moov, atom(b"mdat", &[0u8; 64])].concat()
}

// ============================================================================
// Images
// ============================================================================

pub fn fake_jpeg(len: usize) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE0];
    out.resize(len, 0x11);
    out
}

pub fn fake_png(len: usize) -> Vec<u8> {
    let mut out = b"\x89PNG\r\n\x1a\n".to_vec();
    out.resize(len, 0x22);
    out
}
