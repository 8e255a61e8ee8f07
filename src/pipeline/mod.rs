//! The pipeline engine.
//!
//! A [`Pipeline`] is an ordered list of [`Processor`]s. Running it threads a
//! working set of [`Processed`] images through every stage:
//!
//! ```text
//! working set = [source (tags {original}, original = true)]
//! for each stage:
//!     next = []
//!     for each image in working set (in order):
//!         outputs = stage.process(image)
//!         reject outputs with more than one original marker
//!         next += outputs
//!     working set = next
//! ```
//!
//! Each stage multiplies every image by however many outputs it returns
//! (0, 1 or many) and order is preserved, so the result is a deterministic
//! left-to-right cross product of all stages. The source normally stays first.
//!
//! Any error aborts the run; there is no partial result and no retry.

pub mod cancel;
mod processor;

pub use cancel::{CancelReason, CancelToken, Cancelled};
pub use processor::{FnProcessor, Processed, Processor, ProcessorContext, StageError, processor_fn};

use crate::imaging::to_canonical;
use crate::tags::ORIGINAL;
use image::{DynamicImage, RgbaImage};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{stage} processor (stage {index}): {source}")]
    Stage {
        stage: String,
        index: usize,
        #[source]
        source: StageError,
    },
    #[error("{stage} processor (stage {index}) returned {count} \"original\" images for one input")]
    TooManyOriginals {
        stage: String,
        index: usize,
        count: usize,
    },
    #[error("{stage} processor (stage {index}): {source}")]
    Cancelled {
        stage: String,
        index: usize,
        #[source]
        source: Cancelled,
    },
}

impl PipelineError {
    /// Whether the run stopped because its [`CancelToken`] fired.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Name of the stage the error originated from.
    pub fn stage(&self) -> &str {
        match self {
            Self::Stage { stage, .. }
            | Self::TooManyOriginals { stage, .. }
            | Self::Cancelled { stage, .. } => stage,
        }
    }

    fn from_stage(stage: &str, index: usize, err: StageError) -> Self {
        match err {
            StageError::Cancelled(source) => Self::Cancelled {
                stage: stage.to_string(),
                index,
                source,
            },
            source => Self::Stage {
                stage: stage.to_string(),
                index,
                source,
            },
        }
    }
}

/// An ordered list of processors, fixed at construction.
#[derive(Default)]
pub struct Pipeline {
    processors: Vec<Box<dyn Processor>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl FromIterator<Box<dyn Processor>> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Box<dyn Processor>>>(iter: I) -> Self {
        Self {
            processors: iter.into_iter().collect(),
        }
    }
}

impl Pipeline {
    pub fn new(processors: Vec<Box<dyn Processor>>) -> Self {
        Self { processors }
    }

    /// Start an empty pipeline; append stages with [`then`](Self::then).
    pub fn builder() -> Self {
        Self::default()
    }

    /// Consume the pipeline and return it with `processor` appended.
    pub fn then(mut self, processor: impl Processor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Run every stage on `input` and return the final working set.
    ///
    /// The input is normalized to RGBA8 first. `cancel` is checked before
    /// every processor invocation; a fired token surfaces as
    /// [`PipelineError::Cancelled`].
    pub fn run(
        &self,
        cancel: &CancelToken,
        input: impl Into<DynamicImage>,
    ) -> Result<PipelineResult, PipelineError> {
        let input = Arc::new(to_canonical(input.into()));
        let mut working = vec![Processed::original(Arc::clone(&input))];

        for (index, processor) in self.processors.iter().enumerate() {
            let stage = processor.name();
            let previous = std::mem::take(&mut working);
            tracing::debug!(stage, index, inputs = previous.len(), "running stage");

            for img in &previous {
                cancel
                    .check()
                    .map_err(|source| PipelineError::Cancelled {
                        stage: stage.to_string(),
                        index,
                        source,
                    })?;

                let ctx = ProcessorContext::new(cancel, img);
                let outputs = processor
                    .process(&ctx)
                    .map_err(|e| PipelineError::from_stage(stage, index, e))?;

                let count = outputs.iter().filter(|p| p.original).count();
                if count > 1 {
                    return Err(PipelineError::TooManyOriginals {
                        stage: stage.to_string(),
                        index,
                        count,
                    });
                }

                tracing::trace!(stage, tags = %img.tags, outputs = outputs.len(), "processed image");
                working.extend(outputs);
            }

            tracing::debug!(stage, index, outputs = working.len(), "stage complete");
        }

        Ok(PipelineResult {
            images: working,
            input,
        })
    }
}

/// The outcome of [`Pipeline::run`].
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Final working set, in the order produced.
    pub images: Vec<Processed>,
    /// The normalized source buffer passed to the run.
    pub input: Arc<RgbaImage>,
}

impl PipelineResult {
    /// The variant tagged [`ORIGINAL`], if the pipeline kept one.
    ///
    /// Depending on the stages it may have been transformed in place (e.g.
    /// compressed); [`input`](Self::input) is always the untouched source.
    pub fn original(&self) -> Option<&Processed> {
        self.find(&[ORIGINAL]).into_iter().next()
    }

    /// Images carrying at least one of `tags`. An empty query matches nothing.
    pub fn find(&self, tags: &[&str]) -> Vec<&Processed> {
        self.images
            .iter()
            .filter(|img| tags.iter().any(|t| img.tags.contains(t)))
            .collect()
    }

    /// Images carrying every one of `tags`. An empty query matches nothing.
    pub fn find_all(&self, tags: &[&str]) -> Vec<&Processed> {
        if tags.is_empty() {
            return Vec::new();
        }
        self.images
            .iter()
            .filter(|img| tags.iter().all(|t| img.tags.contains(t)))
            .collect()
    }

    /// Images with at least one tag accepted by `pred`.
    pub fn matching<F>(&self, mut pred: F) -> Vec<&Processed>
    where
        F: FnMut(&str) -> bool,
    {
        self.images
            .iter()
            .filter(|img| img.tags.iter().any(&mut pred))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
