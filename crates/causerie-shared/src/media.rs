//! Image decode / scale / encode helpers.
//!
//! Both cache tiers and the outbound pipeline go through these: the disk
//! tier stores lossless PNG re-encodings of the original remote bytes, the
//! memory tier stores decoded images scaled to the display envelope.

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::constants::THUMBNAIL_EDGE;
use crate::error::MediaError;

/// Decode an encoded image from memory.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, MediaError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Decode an image file from disk.
pub fn decode_file(path: &Path) -> Result<DynamicImage, MediaError> {
    Ok(image::open(path)?)
}

/// Aspect-ratio-preserving fit into the square display envelope.
pub fn fit_to_envelope(img: &DynamicImage) -> DynamicImage {
    img.resize(THUMBNAIL_EDGE, THUMBNAIL_EDGE, FilterType::Triangle)
}

/// Lossless PNG encoding, used for the disk blob tier and outbound temp
/// files.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, MediaError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Decoded size in bytes as accounted by the memory cache (RGBA).
pub fn byte_size(img: &DynamicImage) -> usize {
    img.width() as usize * img.height() as usize * 4
}
