//! MP4/M4A cover-art search.
//!
//! Descends through `moov/udta/meta/ilst` looking for a `covr` atom and
//! returns the picture in its first `data` child. Textual `ilst` items are not
//! read, so title/artist/album for this format always come from defaults.

use crate::artwork::mp4_cover_mime;
use crate::binary::ByteReader;
use crate::error::{MetadataError, Result};
use crate::model::{CoverImage, PartialMetadata};
use bytes::Bytes;
use tracing::{debug, trace, warn};

const ATOM_HEADER_LEN: usize = 8;

/// `meta` is a full box: version + flags precede its children.
const META_EXTRA_LEN: usize = 4;

/// Size + type + type indicator + locale of a `data` atom.
const DATA_HEADER_LEN: usize = 16;

const MAX_ATOM_DEPTH: usize = 8;

const CONTAINER_ATOMS: [&[u8; 4]; 4] = [b"moov", b"udta", b"meta", b"ilst"];

/// Searches the first `scan_limit` bytes of `data` for embedded cover art.
pub fn parse_mp4(data: &[u8], scan_limit: usize) -> PartialMetadata {
    let mut meta = PartialMetadata::default();
    let bounded = &data[..data.len().min(scan_limit)];

    match walk_atoms(bounded, 0) {
        Ok(Some(cover)) => meta.set_cover(cover),
        Ok(None) => trace!("No covr atom found"),
        Err(e) => warn!(error = %e, "Corrupt MP4 atom tree"),
    }

    meta
}

fn walk_atoms(data: &[u8], depth: usize) -> Result<Option<CoverImage>> {
    if depth > MAX_ATOM_DEPTH {
        debug!(depth, "MP4 atom nesting too deep");
        return Ok(None);
    }

    let mut reader = ByteReader::new(data);

    while reader.remaining() >= ATOM_HEADER_LEN {
        let start = reader.position();
        let size = reader.read_u32_be()? as usize;
        let kind = reader.read_fourcc()?;

        match size {
            0 => {
                trace!("Atom runs to end of file, stopping");
                break;
            }
            1 => {
                trace!("64-bit atom size not supported, stopping");
                break;
            }
            s if s < ATOM_HEADER_LEN => {
                return Err(MetadataError::CorruptedFile(format!(
                    "atom size {s} smaller than its header"
                )));
            }
            _ => {}
        }

        let end = start.saturating_add(size);
        // Atoms cut off by the scan bound are still searched as far as they go
        let body = &data[reader.position()..end.min(data.len())];

        trace!(atom = %String::from_utf8_lossy(&kind), size, depth, "MP4 atom");

        if &kind == b"covr" {
            return read_cover_data(body).map(Some);
        }

        if CONTAINER_ATOMS.contains(&&kind) {
            let children = if &kind == b"meta" {
                body.get(META_EXTRA_LEN..).unwrap_or_default()
            } else {
                body
            };
            if let Some(cover) = walk_atoms(children, depth + 1)? {
                return Ok(Some(cover));
            }
        }

        if end >= data.len() {
            break;
        }
        reader.seek(end)?;
    }

    Ok(None)
}

fn read_cover_data(covr_body: &[u8]) -> Result<CoverImage> {
    let mut reader = ByteReader::new(covr_body);
    let size = reader.read_u32_be()? as usize;
    let kind = reader.read_fourcc()?;

    if &kind != b"data" {
        return Err(MetadataError::CorruptedFile(format!(
            "covr child is {:?}, expected data",
            String::from_utf8_lossy(&kind)
        )));
    }
    if size < DATA_HEADER_LEN {
        return Err(MetadataError::CorruptedFile(format!("data atom size {size} too small")));
    }

    let data_type = reader.read_u32_be()?;
    let _locale = reader.read_u32_be()?;
    let image = reader.read_bytes(size - DATA_HEADER_LEN)?;

    Ok(CoverImage::new(
        Bytes::copy_from_slice(image),
        mp4_cover_mime(data_type),
    ))
}
