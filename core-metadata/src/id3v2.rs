//! ID3v2.3 / ID3v2.4 tag parser.
//!
//! Reads the tag header, skips an extended header if flagged, then walks the
//! frame list. Only `TIT2`, `TPE1`, `TALB`, `USLT`, `SYLT` and `APIC` carry
//! data we keep; every other frame is stepped over by its declared size.
//!
//! The one real difference between the two versions here is the frame size
//! field: raw big-endian in v2.3, synchsafe in v2.4.

use crate::artwork::{normalize_mime, PICTURE_TYPE_FRONT_COVER};
use crate::binary::{decode_synchsafe, ByteReader};
use crate::error::{MetadataError, Result};
use crate::lyrics::{parse_lrc, SyncedLyricLine};
use crate::model::{CoverImage, PartialMetadata};
use crate::text::{decode_text, decode_with_byte, TextEncoding};
use bytes::Bytes;
use tracing::{debug, trace, warn};

pub const ID3_SIGNATURE: &[u8; 3] = b"ID3";

const TAG_HEADER_LEN: usize = 10;
const FRAME_HEADER_LEN: usize = 10;
const FLAG_EXTENDED_HEADER: u8 = 0x40;
const LANGUAGE_LEN: usize = 3;

/// SYLT time stamp format: absolute MPEG frames.
const SYLT_FORMAT_MPEG_FRAMES: u8 = 1;

/// Parsed 10-byte tag header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub major_version: u8,
    pub revision: u8,
    pub flags: u8,
    /// Tag size excluding the 10-byte header
    pub size: usize,
}

impl TagHeader {
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let signature = reader.read_bytes(ID3_SIGNATURE.len())?;
        if signature != ID3_SIGNATURE {
            return Err(MetadataError::UnsupportedFormat("missing ID3 signature".into()));
        }
        let major_version = reader.read_u8()?;
        let revision = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let size = reader.read_synchsafe_u32()? as usize;

        Ok(Self {
            major_version,
            revision,
            flags,
            size,
        })
    }

    pub fn has_extended_header(&self) -> bool {
        self.flags & FLAG_EXTENDED_HEADER != 0
    }

    /// Decodes a frame size field for this tag version.
    pub fn frame_size(&self, raw: u32) -> usize {
        if self.major_version >= 4 {
            decode_synchsafe(raw) as usize
        } else {
            raw as usize
        }
    }
}

struct Frame<'a> {
    id: [u8; 4],
    payload: &'a [u8],
}

impl Frame<'_> {
    fn id_str(&self) -> &str {
        std::str::from_utf8(&self.id).unwrap_or("????")
    }
}

/// Per-tag parse state beyond what `PartialMetadata` holds.
#[derive(Default)]
struct TagState {
    cover_picture_type: Option<u8>,
    synced_lines: Option<Vec<SyncedLyricLine>>,
}

/// Parses an ID3v2 tag at the start of `data`. Anything other than a
/// v2.3/v2.4 tag yields an empty result.
pub fn parse_id3v2(data: &[u8]) -> PartialMetadata {
    let mut meta = PartialMetadata::default();

    if !data.starts_with(ID3_SIGNATURE) {
        trace!("Missing ID3 signature");
        return meta;
    }

    let mut reader = ByteReader::new(data);
    let header = match TagHeader::read(&mut reader) {
        Ok(header) => header,
        Err(e) => {
            debug!(error = %e, "Truncated ID3v2 header");
            return meta;
        }
    };

    if !matches!(header.major_version, 3 | 4) {
        debug!(version = header.major_version, "Unsupported ID3v2 version");
        return meta;
    }

    debug!(
        version = header.major_version,
        size = header.size,
        extended = header.has_extended_header(),
        "ID3v2 tag header"
    );

    let tag_end = TAG_HEADER_LEN.saturating_add(header.size).min(data.len());
    let mut frames = ByteReader::new(&data[TAG_HEADER_LEN.min(tag_end)..tag_end]);

    if header.has_extended_header() {
        if let Err(e) = skip_extended_header(&mut frames, &header) {
            warn!(error = %e, "Corrupt ID3v2 extended header");
            return meta;
        }
    }

    let mut state = TagState::default();

    while frames.remaining() >= FRAME_HEADER_LEN {
        let frame = match read_frame(&mut frames, &header) {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Stopping ID3v2 frame walk");
                break;
            }
        };

        trace!(id = frame.id_str(), size = frame.payload.len(), "ID3v2 frame");

        if let Err(e) = handle_frame(&frame, &mut meta, &mut state) {
            debug!(id = frame.id_str(), error = %e, "Skipping malformed ID3v2 frame");
        }
    }

    if let Some(lines) = state.synced_lines {
        meta.apply_synced_lines(lines);
    }

    meta
}

fn skip_extended_header(reader: &mut ByteReader<'_>, header: &TagHeader) -> Result<()> {
    if header.major_version >= 4 {
        // v2.4: synchsafe size counts the size field itself
        let size = reader.read_synchsafe_u32()? as usize;
        if size < 4 {
            return Err(MetadataError::CorruptedFile(format!(
                "extended header size {size} smaller than its size field"
            )));
        }
        reader.skip(size - 4)
    } else {
        // v2.3: raw size excludes the size field
        let size = reader.read_u32_be()? as usize;
        reader.skip(size)
    }
}

/// Reads the next frame. `Ok(None)` marks padding or an implausible frame id.
fn read_frame<'a>(reader: &mut ByteReader<'a>, header: &TagHeader) -> Result<Option<Frame<'a>>> {
    let id = reader.read_fourcc()?;
    if id[0] == 0 {
        return Ok(None);
    }
    if !id.iter().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
        debug!(id = ?id, "Invalid ID3v2 frame id");
        return Ok(None);
    }

    let size = header.frame_size(reader.read_u32_be()?);
    let _flags = reader.read_bytes(2)?;

    if size == 0 {
        return Err(MetadataError::CorruptedFile("zero-sized frame".into()));
    }
    if size > reader.remaining() {
        return Err(MetadataError::CorruptedFile(format!(
            "frame size {size} overruns tag ({} bytes left)",
            reader.remaining()
        )));
    }

    let payload = reader.read_bytes(size)?;
    Ok(Some(Frame { id, payload }))
}

fn handle_frame(frame: &Frame<'_>, meta: &mut PartialMetadata, state: &mut TagState) -> Result<()> {
    match &frame.id {
        b"TIT2" => meta.set_title(&read_text_frame(frame.payload)?),
        b"TPE1" => meta.set_artist(&read_text_frame(frame.payload)?),
        b"TALB" => meta.set_album(&read_text_frame(frame.payload)?),
        b"USLT" => {
            let lyrics = read_uslt(frame.payload)?;
            meta.apply_lyrics(parse_lrc(&lyrics));
        }
        b"SYLT" => {
            let lines = read_sylt(frame.payload)?;
            if state.synced_lines.is_none() && !lines.is_empty() {
                state.synced_lines = Some(lines);
            }
        }
        b"APIC" => {
            let (picture_type, cover) = read_apic(frame.payload)?;
            let replace_with_front = picture_type == PICTURE_TYPE_FRONT_COVER
                && state.cover_picture_type != Some(PICTURE_TYPE_FRONT_COVER);

            if (meta.cover.is_none() || replace_with_front) && !cover.is_empty() {
                meta.cover = Some(cover);
                state.cover_picture_type = Some(picture_type);
            }
        }
        _ => {}
    }
    Ok(())
}

fn read_encoding(reader: &mut ByteReader<'_>) -> Result<TextEncoding> {
    let byte = reader.read_u8()?;
    TextEncoding::from_byte(byte)
        .ok_or_else(|| MetadataError::CorruptedFile(format!("unknown text encoding {byte}")))
}

/// First value of a `T***` frame.
fn read_text_frame(payload: &[u8]) -> Result<String> {
    let mut reader = ByteReader::new(payload);
    let encoding = reader.read_u8()?;
    let width = TextEncoding::from_byte(encoding)
        .map(|e| e.terminator_width())
        .unwrap_or(1);
    Ok(decode_with_byte(encoding, reader.read_terminated(width)))
}

fn read_uslt(payload: &[u8]) -> Result<String> {
    let mut reader = ByteReader::new(payload);
    let encoding = read_encoding(&mut reader)?;
    reader.skip(LANGUAGE_LEN)?;
    let _descriptor = reader.read_terminated(encoding.terminator_width());
    Ok(decode_text(encoding, reader.read_rest()))
}

fn read_sylt(payload: &[u8]) -> Result<Vec<SyncedLyricLine>> {
    let mut reader = ByteReader::new(payload);
    let encoding = read_encoding(&mut reader)?;
    reader.skip(LANGUAGE_LEN)?;
    let timestamp_format = reader.read_u8()?;
    let _content_type = reader.read_u8()?;
    let width = encoding.terminator_width();
    let _descriptor = reader.read_terminated(width);

    if timestamp_format == SYLT_FORMAT_MPEG_FRAMES {
        // Frame-based timing needs the stream's frame rate; read as milliseconds.
        trace!("SYLT uses MPEG frame timestamps, reading them as milliseconds");
    }

    let mut lines = Vec::new();
    while !reader.is_empty() {
        let text = decode_text(encoding, reader.read_terminated(width));
        let Ok(timestamp) = reader.read_u32_be() else {
            debug!("Truncated SYLT entry");
            break;
        };
        if !text.is_empty() {
            lines.push(SyncedLyricLine::new(timestamp as f64 / 1000.0, text));
        }
    }
    Ok(lines)
}

fn read_apic(payload: &[u8]) -> Result<(u8, CoverImage)> {
    let mut reader = ByteReader::new(payload);
    let encoding = read_encoding(&mut reader)?;
    // MIME type is always Latin-1
    let mime = decode_text(TextEncoding::Latin1, reader.read_terminated(1));
    let picture_type = reader.read_u8()?;
    let _description = reader.read_terminated(encoding.terminator_width());
    let image = reader.read_rest();

    Ok((
        picture_type,
        CoverImage::new(Bytes::copy_from_slice(image), normalize_mime(&mime)),
    ))
}
