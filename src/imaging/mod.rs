//! External collaborators of the pipeline, in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Normalize** | `DynamicImage::into_rgba8` |
//! | **Resize** | `image::imageops::resize`, Lanczos3 by default |
//! | **Encode / decode** | `image` JPEG and PNG codecs |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Quality, filter and format descriptors
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Convert**: pixel-format normalization into [`image::RgbaImage`]

pub mod backend;
mod calculations;
mod convert;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{compare_dimensions, resolve_target};
pub use convert::to_canonical;
pub use params::{EncodeFormat, Quality, ResampleFilter};
pub use rust_backend::{RustBackend, is_supported_input, jpeg_size, load_image};
