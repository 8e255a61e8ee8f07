//! The processor contract shared by every pipeline stage.

use super::cancel::{CancelToken, Cancelled};
use crate::imaging::BackendError;
use crate::tags::{ORIGINAL, Tags};
use image::RgbaImage;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a single [`Processor`] invocation.
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// An image variant flowing through a pipeline.
///
/// The pixel buffer is shared behind an [`Arc`] and never mutated in place;
/// stages that change pixels allocate a new buffer, so variants cannot alias
/// each other's storage after a transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub image: Arc<RgbaImage>,
    pub tags: Tags,
    /// Set on the pipeline's source image (possibly transformed in place by
    /// an opted-in stage). At most one per working set.
    pub original: bool,
}

impl Processed {
    /// The source image of a run: tagged [`ORIGINAL`] with the marker set.
    pub fn original(image: impl Into<Arc<RgbaImage>>) -> Self {
        Self {
            image: image.into(),
            tags: Tags::new([ORIGINAL]),
            original: true,
        }
    }

    /// A derived image with the given tags and no original marker.
    pub fn derived(image: impl Into<Arc<RgbaImage>>, tags: Tags) -> Self {
        Self {
            image: image.into(),
            tags,
            original: false,
        }
    }

    /// A copy of this variant carrying additional tags.
    pub fn with_tags<I>(&self, add: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            image: Arc::clone(&self.image),
            tags: self.tags.with(add),
            original: self.original,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Input of one [`Processor::process`] call: a single image plus the run's
/// cancellation state.
#[derive(Debug, Clone, Copy)]
pub struct ProcessorContext<'a> {
    image: &'a Processed,
    cancel: &'a CancelToken,
}

impl<'a> ProcessorContext<'a> {
    pub fn new(cancel: &'a CancelToken, image: &'a Processed) -> Self {
        Self { image, cancel }
    }

    pub fn image(&self) -> &'a Processed {
        self.image
    }

    pub fn is_original(&self) -> bool {
        self.image.original
    }

    pub fn cancel_token(&self) -> &'a CancelToken {
        self.cancel
    }

    /// Returns a [`StageError::Cancelled`] once the run has been cancelled.
    pub fn check_cancelled(&self) -> Result<(), StageError> {
        self.cancel.check().map_err(StageError::from)
    }
}

/// One pipeline stage: turns a single image into zero or more images.
///
/// Implementations must not mutate the input; every output is a fresh
/// [`Processed`] value (cloning the input is enough to pass it through).
pub trait Processor: Send + Sync {
    fn process(&self, ctx: &ProcessorContext<'_>) -> Result<Vec<Processed>, StageError>;

    /// Identity used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("processor")
    }
}

impl<P: Processor + ?Sized> Processor for Box<P> {
    fn process(&self, ctx: &ProcessorContext<'_>) -> Result<Vec<Processed>, StageError> {
        (**self).process(ctx)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A closure-backed [`Processor`]. Build with [`processor_fn`].
pub struct FnProcessor<F> {
    name: String,
    func: F,
}

impl<F> fmt::Debug for FnProcessor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProcessor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Use a plain function as a pipeline stage.
pub fn processor_fn<F>(name: impl Into<String>, func: F) -> FnProcessor<F>
where
    F: Fn(&ProcessorContext<'_>) -> Result<Vec<Processed>, StageError> + Send + Sync,
{
    FnProcessor {
        name: name.into(),
        func,
    }
}

impl<F> Processor for FnProcessor<F>
where
    F: Fn(&ProcessorContext<'_>) -> Result<Vec<Processed>, StageError> + Send + Sync,
{
    fn process(&self, ctx: &ProcessorContext<'_>) -> Result<Vec<Processed>, StageError> {
        (self.func)(ctx)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
