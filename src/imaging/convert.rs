//! Pixel-format normalization.
//!
//! Every buffer inside a pipeline is an [`RgbaImage`]: 8 bits per channel,
//! four channels, straight (non-premultiplied) alpha. Anything else is
//! converted on entry.

use image::{DynamicImage, RgbaImage};

/// Convert any decoded image into the canonical RGBA8 representation.
///
/// Buffers that are already RGBA8 are moved through without copying.
pub fn to_canonical(image: DynamicImage) -> RgbaImage {
    match image {
        DynamicImage::ImageRgba8(buf) => buf,
        other => other.into_rgba8(),
    }
}
