//! Resizing stage.
//!
//! A [`Resizer`] produces one derived image per configured [`Dimensions`],
//! sorted by width then height. Derived images lose the `original` tag and
//! gain [`RESIZED`](crate::tags::RESIZED); when the sizes were given by name,
//! they also get `size=<name>`. The input itself is passed through first
//! unless [`discard_input`](Resizer::discard_input) is set.

use crate::imaging::{
    BackendError, Dimensions, ImageBackend, ResampleFilter, RustBackend, compare_dimensions,
};
use crate::pipeline::{Processed, Processor, ProcessorContext, StageError};
use crate::tags::{ORIGINAL, RESIZED, SIZE_PREFIX, Tags};
use image::RgbaImage;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Where a [`Resizer`] gets its target sizes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionProvider {
    /// Plain sizes; resized images get no `size=` tag.
    List(Vec<Dimensions>),
    /// Named sizes; each resized image is tagged `size=<name>`.
    Map(BTreeMap<String, Dimensions>),
}

impl DimensionProvider {
    /// Sizes paired with their names, in output order (width, height, name).
    pub fn entries(&self) -> Vec<(Dimensions, Option<String>)> {
        let mut entries: Vec<_> = match self {
            Self::List(dims) => dims.iter().map(|d| (*d, None)).collect(),
            Self::Map(named) => named
                .iter()
                .map(|(name, d)| (*d, Some(name.clone())))
                .collect(),
        };
        entries.sort_by(|(a, an), (b, bn)| compare_dimensions(a, b).then_with(|| an.cmp(bn)));
        entries
    }
}

impl From<Vec<Dimensions>> for DimensionProvider {
    fn from(dims: Vec<Dimensions>) -> Self {
        Self::List(dims)
    }
}

impl<S: Into<String>> FromIterator<(S, Dimensions)> for DimensionProvider {
    fn from_iter<I: IntoIterator<Item = (S, Dimensions)>>(iter: I) -> Self {
        Self::Map(iter.into_iter().map(|(n, d)| (n.into(), d)).collect())
    }
}

/// Resizes images to a fixed set of dimensions.
pub struct Resizer {
    sizes: Vec<(Dimensions, Option<String>)>,
    filter: ResampleFilter,
    discard_input: bool,
    backend: Arc<dyn ImageBackend>,
}

impl std::fmt::Debug for Resizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resizer")
            .field("sizes", &self.sizes)
            .field("filter", &self.filter)
            .field("discard_input", &self.discard_input)
            .finish_non_exhaustive()
    }
}

impl Resizer {
    /// A resizer using Lanczos3 on the [`RustBackend`], keeping the input.
    pub fn new(dimensions: impl Into<DimensionProvider>) -> Self {
        Self {
            sizes: dimensions.into().entries(),
            filter: ResampleFilter::default(),
            discard_input: false,
            backend: Arc::new(RustBackend::new()),
        }
    }

    pub fn filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Drop the input image from this stage's output.
    pub fn discard_input(mut self, discard: bool) -> Self {
        self.discard_input = discard;
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ImageBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Configured sizes in output order.
    pub fn dimensions(&self) -> Vec<Dimensions> {
        self.sizes.iter().map(|(d, _)| *d).collect()
    }

    /// Resize `image` to every configured size, in output order.
    pub fn resize(&self, image: &RgbaImage) -> Result<Vec<RgbaImage>, BackendError> {
        self.sizes
            .iter()
            .map(|(dim, _)| self.backend.resize(image, *dim, self.filter))
            .collect()
    }
}

impl Processor for Resizer {
    fn process(&self, ctx: &ProcessorContext<'_>) -> Result<Vec<Processed>, StageError> {
        let input = ctx.image();
        let base = input.tags.without([ORIGINAL]).with([RESIZED]);

        let mut out = Vec::with_capacity(self.sizes.len() + 1);
        if !self.discard_input {
            out.push(input.clone());
        }

        for (dim, name) in &self.sizes {
            ctx.check_cancelled()?;
            let resized = self.backend.resize(&input.image, *dim, self.filter)?;
            let tags = match name {
                Some(name) => base.with([format!("{SIZE_PREFIX}{name}")]),
                None => base.clone(),
            };
            out.push(Processed::derived(resized, tags));
        }

        Ok(out)
    }

    fn name(&self) -> &str {
        "resize"
    }
}

/// The size name recorded by a named [`Resizer`], i.e. the `size=` suffix.
pub fn dimension_name(tags: &Tags) -> Option<&str> {
    tags.iter().find_map(|t| t.strip_prefix(SIZE_PREFIX))
}
