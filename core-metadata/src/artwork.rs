//! Cover artwork helpers shared by the container parsers.
//!
//! Normalizes the MIME strings taggers write for embedded pictures and builds
//! the deterministic placeholder URL used when a file carries no cover.

/// MIME type assumed when a picture block leaves it empty.
pub const DEFAULT_COVER_MIME: &str = "image/jpeg";

/// APIC picture type for the front cover.
pub const PICTURE_TYPE_FRONT_COVER: u8 = 3;

/// MP4 `data` atom type code for PNG images.
pub const MP4_DATA_TYPE_PNG: u32 = 14;

/// Normalizes a picture MIME string.
///
/// Empty values become `image/jpeg`; bare format names (`PNG`, `JPG`) that
/// some ID3v2.3 taggers write are expanded to a full `image/*` type.
pub fn normalize_mime(raw: &str) -> String {
    let mime = raw.trim().to_ascii_lowercase();
    if mime.is_empty() {
        return DEFAULT_COVER_MIME.to_string();
    }
    if mime.contains('/') {
        return mime;
    }
    match mime.as_str() {
        "jpg" | "jpeg" => DEFAULT_COVER_MIME.to_string(),
        "png" => "image/png".to_string(),
        other => format!("image/{other}"),
    }
}

/// MIME type for an MP4 `covr` data atom type code.
pub fn mp4_cover_mime(data_type: u32) -> &'static str {
    if data_type == MP4_DATA_TYPE_PNG {
        "image/png"
    } else {
        DEFAULT_COVER_MIME
    }
}

/// Deterministic placeholder image URL seeded by the file name.
///
/// ```rust
/// use core_metadata::artwork::placeholder_cover_url;
///
/// let url = placeholder_cover_url("https://picsum.photos/seed", "My Song.mp3", 300);
/// assert_eq!(url, "https://picsum.photos/seed/My%20Song.mp3/300/300");
/// ```
pub fn placeholder_cover_url(base_url: &str, file_name: &str, size: u32) -> String {
    format!(
        "{}/{}/{size}/{size}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(file_name)
    )
}
