//! Compression stage.
//!
//! A [`Compressor`] applies each configured [`Compression`] to every image it
//! receives, producing one output per compression tagged
//! [`COMPRESSED`](crate::tags::COMPRESSED) plus the compression's own
//! descriptive tags. The pipeline's original image is passed through
//! untouched unless [`compress_original`](Compressor::compress_original) is
//! set, in which case it is compressed in place and keeps its marker.

use crate::imaging::{BackendError, EncodeFormat, ImageBackend, Quality, RustBackend};
use crate::pipeline::{Processed, Processor, ProcessorContext, StageError};
use crate::tags::{COMPRESSED, ORIGINAL, Tags};
use image::RgbaImage;
use std::fmt;
use std::sync::Arc;

type CompressFn = dyn Fn(&RgbaImage) -> Result<RgbaImage, BackendError> + Send + Sync;

/// One lossy transform: pixels in, degraded pixels out.
///
/// Descriptive tags (e.g. `compression=jpeg,quality=75`) are optional and
/// fixed when the value is built.
#[derive(Clone)]
pub struct Compression {
    name: String,
    apply: Arc<CompressFn>,
    tags: Option<Tags>,
}

impl fmt::Debug for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compression")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

impl Compression {
    pub fn new<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&RgbaImage) -> Result<RgbaImage, BackendError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            apply: Arc::new(apply),
            tags: None,
        }
    }

    /// Attach descriptive tags added to every image this compression produces.
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }

    /// JPEG re-encode at `quality` on the [`RustBackend`].
    pub fn jpeg(quality: Quality) -> Self {
        Self::jpeg_with(Arc::new(RustBackend::new()), quality)
    }

    /// JPEG re-encode at `quality`: encode, then decode back to RGBA8.
    pub fn jpeg_with(backend: Arc<dyn ImageBackend>, quality: Quality) -> Self {
        Self::new(format!("jpeg@{quality}"), move |img| {
            let bytes = backend.encode(img, EncodeFormat::Jpeg(quality))?;
            backend.decode(&bytes)
        })
        .with_tags(Tags::new([format!("compression=jpeg,quality={quality}")]))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> Option<&Tags> {
        self.tags.as_ref()
    }

    pub fn apply(&self, image: &RgbaImage) -> Result<RgbaImage, BackendError> {
        (self.apply)(image)
    }
}

/// Compresses images with one or more [`Compression`]s.
#[derive(Debug, Clone)]
pub struct Compressor {
    compressions: Vec<Compression>,
    compress_original: bool,
}

impl Compressor {
    pub fn new(compression: Compression) -> Self {
        Self::many(vec![compression])
    }

    pub fn many(compressions: Vec<Compression>) -> Self {
        Self {
            compressions,
            compress_original: false,
        }
    }

    /// Also compress the pipeline's original image instead of passing it
    /// through at full fidelity.
    pub fn compress_original(mut self, enabled: bool) -> Self {
        self.compress_original = enabled;
        self
    }

    pub fn compressions(&self) -> &[Compression] {
        &self.compressions
    }

    /// Apply every configured compression to `image`, in order.
    pub fn compress(&self, image: &RgbaImage) -> Result<Vec<RgbaImage>, BackendError> {
        self.compressions.iter().map(|c| c.apply(image)).collect()
    }
}

impl Processor for Compressor {
    fn process(&self, ctx: &ProcessorContext<'_>) -> Result<Vec<Processed>, StageError> {
        let input = ctx.image();
        if input.original && !self.compress_original {
            return Ok(vec![input.clone()]);
        }

        let mut out = Vec::with_capacity(self.compressions.len());
        for (i, compression) in self.compressions.iter().enumerate() {
            ctx.check_cancelled()?;
            let image = compression.apply(&input.image)?;

            // Only the first compression of the original inherits the marker.
            let original = input.original && i == 0;
            let mut tags = if input.original && !original {
                input.tags.without([ORIGINAL])
            } else {
                input.tags.clone()
            };
            tags = tags.with([COMPRESSED]);
            if let Some(extra) = compression.tags() {
                tags = tags.with(extra);
            }

            out.push(Processed {
                image: Arc::new(image),
                tags,
                original,
            });
        }

        Ok(out)
    }

    fn name(&self) -> &str {
        "compress"
    }
}
