//! FLAC metadata-block parser.
//!
//! Walks the block chain after the `fLaC` signature and reads the
//! VORBIS_COMMENT (type 4) and PICTURE (type 6) blocks. Every other block
//! type is skipped by its declared size.

use crate::artwork::normalize_mime;
use crate::binary::ByteReader;
use crate::error::Result;
use crate::lyrics::{looks_like_lrc, parse_lrc};
use crate::model::{CoverImage, PartialMetadata};
use crate::text::decode_utf8;
use bytes::Bytes;
use tracing::{debug, trace, warn};

pub const FLAC_SIGNATURE: &[u8; 4] = b"fLaC";

const BLOCK_VORBIS_COMMENT: u8 = 4;
const BLOCK_PICTURE: u8 = 6;

/// Width/height/depth/colour-count fields of a PICTURE block.
const PICTURE_DIMENSIONS_LEN: usize = 16;

const LYRICS_KEYS: &[&str] = &[
    "LYRICS",
    "UNSYNCEDLYRICS",
    "LYRIC",
    "SYNCEDLYRICS",
    "SYNCHRONIZEDLYRICS",
];

/// Header preceding every metadata block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockHeader {
    is_last: bool,
    block_type: u8,
    size: usize,
}

impl BlockHeader {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let flags = reader.read_u8()?;
        let size = reader.read_u24_be()? as usize;
        Ok(Self {
            is_last: flags & 0x80 != 0,
            block_type: flags & 0x7F,
            size,
        })
    }
}

/// Parses FLAC metadata. A buffer without the `fLaC` signature yields an
/// empty result.
pub fn parse_flac(data: &[u8]) -> PartialMetadata {
    let mut meta = PartialMetadata::default();

    if !data.starts_with(FLAC_SIGNATURE) {
        trace!("Missing fLaC signature");
        return meta;
    }

    let mut reader = ByteReader::new(&data[FLAC_SIGNATURE.len()..]);
    let mut comment_fallback: Option<String> = None;

    while !reader.is_empty() {
        let header = match BlockHeader::read(&mut reader) {
            Ok(header) => header,
            Err(e) => {
                warn!(error = %e, "Truncated FLAC block header");
                break;
            }
        };

        let payload = match reader.read_bytes(header.size) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    block_type = header.block_type,
                    error = %e,
                    "FLAC block overruns buffer"
                );
                break;
            }
        };

        trace!(
            block_type = header.block_type,
            size = header.size,
            last = header.is_last,
            "FLAC metadata block"
        );

        let result = match header.block_type {
            BLOCK_VORBIS_COMMENT => parse_vorbis_comment(payload, &mut meta, &mut comment_fallback),
            BLOCK_PICTURE => parse_picture(payload, &mut meta),
            _ => Ok(()),
        };

        if let Err(e) = result {
            debug!(block_type = header.block_type, error = %e, "Skipping malformed FLAC block");
        }

        if header.is_last {
            break;
        }
    }

    if meta.lyrics.is_none() {
        if let Some(comment) = comment_fallback {
            meta.apply_lyrics(parse_lrc(&comment));
        }
    }

    meta
}

fn parse_vorbis_comment(
    payload: &[u8],
    meta: &mut PartialMetadata,
    comment_fallback: &mut Option<String>,
) -> Result<()> {
    let mut reader = ByteReader::new(payload);
    let _vendor = reader.read_prefixed_le()?;
    let count = reader.read_u32_le()?;

    for _ in 0..count {
        let comment = decode_utf8(reader.read_prefixed_le()?);
        let Some((key, value)) = comment.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_uppercase();

        match key.as_str() {
            "TITLE" => meta.set_title(value),
            "ARTIST" => meta.set_artist(value),
            "ALBUM" => meta.set_album(value),
            k if LYRICS_KEYS.contains(&k) => meta.apply_lyrics(parse_lrc(value)),
            "COMMENT" | "DESCRIPTION" => {
                if comment_fallback.is_none() && looks_like_lrc(value) {
                    *comment_fallback = Some(value.to_string());
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn parse_picture(payload: &[u8], meta: &mut PartialMetadata) -> Result<()> {
    let mut reader = ByteReader::new(payload);
    let _picture_type = reader.read_u32_be()?;
    let mime = decode_utf8(reader.read_prefixed_be()?);
    let _description = reader.read_prefixed_be()?;
    reader.skip(PICTURE_DIMENSIONS_LEN)?;
    let image = reader.read_prefixed_be()?;

    meta.set_cover(CoverImage::new(
        Bytes::copy_from_slice(image),
        normalize_mime(&mime),
    ));
    Ok(())
}
