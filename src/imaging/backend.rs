//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the narrow interface through which pipeline
//! stages reach the codec and resampling collaborators: resize, encode and
//! decode. Everything crossing it is a canonical [`RgbaImage`] (8-bit,
//! non-premultiplied, 4 channels), so stages never see foreign pixel formats.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image` crate.

use super::params::{EncodeFormat, ResampleFilter};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Invalid target dimensions {target} for a {width}x{height} image")]
    InvalidDimensions {
        target: Dimensions,
        width: u32,
        height: u32,
    },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// A target size in pixels.
///
/// A zero height means "derive from the width, keeping the aspect ratio"
/// (and vice versa). See [`resolve_target`](super::resolve_target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width-only target; the height follows the source aspect ratio.
    pub const fn width(width: u32) -> Self {
        Self { width, height: 0 }
    }
}

impl From<[u32; 2]> for Dimensions {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[width={}, height={}]", self.width, self.height)
    }
}

/// Codec and resampling collaborators used by pipeline stages.
///
/// Implementations must be deterministic for fixed parameters and must never
/// alter image dimensions except through `resize`.
pub trait ImageBackend: Send + Sync {
    /// Resample `image` to `target`. A zero edge is derived proportionally.
    fn resize(
        &self,
        image: &RgbaImage,
        target: Dimensions,
        filter: ResampleFilter,
    ) -> Result<RgbaImage, BackendError>;

    /// Encode `image` into the given format.
    fn encode(&self, image: &RgbaImage, format: EncodeFormat) -> Result<Vec<u8>, BackendError>;

    /// Decode bytes of any supported format into a canonical buffer.
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, BackendError>;
}
