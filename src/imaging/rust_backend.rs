//! Pure Rust image backend on top of the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` / `ImageReader` |
//! | Resize | `image::imageops::resize` with the configured filter (Lanczos3 by default) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (alpha dropped) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::resolve_target;
use super::convert::to_canonical;
use super::params::{EncodeFormat, Quality, ResampleFilter};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, RgbaImage};
use std::path::Path;
use std::sync::LazyLock;

const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has one of the [`supported_input_extensions`] (case-insensitive).
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Load and decode an image from disk into the canonical pixel format.
pub fn load_image(path: &Path) -> Result<RgbaImage, BackendError> {
    let img = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))?;
    Ok(to_canonical(img))
}

/// Byte size of `image` encoded as JPEG at quality 100.
///
/// Used to compare the information content of variants: a buffer that went
/// through lossy compression re-encodes smaller than its source.
pub fn jpeg_size(image: &RgbaImage) -> Result<usize, BackendError> {
    RustBackend::new()
        .encode(image, EncodeFormat::Jpeg(Quality::new(100)))
        .map(|bytes| bytes.len())
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_jpeg(image: &RgbaImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.value() as u8)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| BackendError::Encode(format!("PNG encode failed: {}", e)))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn resize(
        &self,
        image: &RgbaImage,
        target: Dimensions,
        filter: ResampleFilter,
    ) -> Result<RgbaImage, BackendError> {
        let (width, height) = resolve_target(image.dimensions(), target).ok_or(
            BackendError::InvalidDimensions {
                target,
                width: image.width(),
                height: image.height(),
            },
        )?;
        Ok(image::imageops::resize(
            image,
            width,
            height,
            filter.filter_type(),
        ))
    }

    fn encode(&self, image: &RgbaImage, format: EncodeFormat) -> Result<Vec<u8>, BackendError> {
        match format {
            EncodeFormat::Jpeg(quality) => encode_jpeg(image, quality),
            EncodeFormat::Png => encode_png(image),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError> {
        let img = image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(to_canonical(img))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::sample_image;

    #[test]
    fn resize_to_exact_dimensions() {
        let img = sample_image(200, 100);
        let out = RustBackend::new()
            .resize(&img, Dimensions::new(50, 40), ResampleFilter::Lanczos3)
            .unwrap();
        assert_eq!(out.dimensions(), (50, 40));
    }

    #[test]
    fn resize_derives_height() {
        let img = sample_image(200, 100);
        let out = RustBackend::new()
            .resize(&img, Dimensions::width(80), ResampleFilter::Triangle)
            .unwrap();
        assert_eq!(out.dimensions(), (80, 40));
    }

    #[test]
    fn resize_rejects_zero_target() {
        let img = sample_image(20, 10);
        let err = RustBackend::new()
            .resize(&img, Dimensions::new(0, 0), ResampleFilter::Lanczos3)
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidDimensions { .. }));
    }

    #[test]
    fn jpeg_round_trip_keeps_dimensions() {
        let backend = RustBackend::new();
        let img = sample_image(64, 48);
        let bytes = backend
            .encode(&img, EncodeFormat::Jpeg(Quality::new(75)))
            .unwrap();
        let decoded = backend.decode(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn jpeg_encoding_is_deterministic() {
        let backend = RustBackend::new();
        let img = sample_image(32, 32);
        let a = backend.encode(&img, EncodeFormat::Jpeg(Quality::new(60))).unwrap();
        let b = backend.encode(&img, EncodeFormat::Jpeg(Quality::new(60))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let backend = RustBackend::new();
        let img = sample_image(16, 12);
        let bytes = backend.encode(&img, EncodeFormat::Png).unwrap();
        assert_eq!(backend.decode(&bytes).unwrap(), img);
    }

    #[test]
    fn decode_garbage_fails() {
        let err = RustBackend::new().decode(b"not an image").unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[test]
    fn lower_quality_encodes_smaller() {
        let backend = RustBackend::new();
        let img = sample_image(120, 90);
        let high = backend.encode(&img, EncodeFormat::Jpeg(Quality::new(95))).unwrap();
        let low = backend.encode(&img, EncodeFormat::Jpeg(Quality::new(20))).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn supported_extensions_cover_common_formats() {
        assert!(is_supported_input(Path::new("a/b/photo.JPG")));
        assert!(is_supported_input(Path::new("photo.png")));
        assert!(!is_supported_input(Path::new("notes.txt")));
        assert!(!is_supported_input(Path::new("noext")));
    }

    #[test]
    fn load_image_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("sample.png");
        let img = sample_image(10, 8);
        std::fs::write(&path, encode_png(&img).unwrap()).unwrap();
        assert_eq!(load_image(&path).unwrap(), img);
    }
}
