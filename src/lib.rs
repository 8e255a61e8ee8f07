//! # Image Variants
//!
//! A small engine that turns one source image into a set of tagged variants:
//! resized copies, compressed copies, and any combination of both. Each
//! variant carries an ordered set of string tags describing how it was made,
//! so callers can later pick "the 640px JPEG at quality 75" by tag instead of
//! by file name.
//!
//! # Architecture: Fan-Out Pipeline
//!
//! A [`Pipeline`] is an ordered list of [`Processor`] stages. Every stage maps
//! each image of the working set to zero or more images, and the outputs of a
//! stage become the inputs of the next:
//!
//! ```text
//! source ──▶ Resizer ──▶ Compressor ──▶ Tagger ──▶ PipelineResult
//!   1          1+3           1+3×2         7
//! ```
//!
//! The source enters with the tag `original` and the original marker. Stages
//! may keep it, drop it or pass it through; no stage may produce two originals
//! from one input.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`tags`] | Ordered, de-duplicated tag sets and the well-known tag names |
//! | [`pipeline`] | The engine: [`Processor`] trait, [`Pipeline::run`], cancellation |
//! | [`stages`] | Built-in stages: [`Resizer`](stages::Resizer), [`Compressor`](stages::Compressor), [`Tagger`](stages::Tagger) |
//! | [`imaging`] | Pure-Rust pixel operations behind the [`ImageBackend`](imaging::ImageBackend) trait |
//! | [`config`] | TOML config loading, validation, and pipeline construction |
//! | [`batch`] | Input discovery and parallel processing of many files |
//! | [`export`] | Writing variants and their JSON manifest to disk |
//! | [`logging`] | `tracing` subscriber setup for the binary |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Immutable Pixel Buffers
//!
//! Stages never mutate the image they receive. Pixel data lives in an
//! `Arc<RgbaImage>`, so passing an image through unchanged (the original in the
//! compressor, the input in the resizer) is a reference-count bump, not a copy.
//! Tags are owned values and are always copied before being extended.
//!
//! ## One Canonical Pixel Format
//!
//! Every input is converted to 8-bit RGBA before the first stage runs. Stages
//! and backends only ever see one layout, which keeps resize and encode code
//! free of per-format branches.
//!
//! ## Cooperative Cancellation
//!
//! A [`CancelToken`] is checked before every processor invocation and inside
//! stages between units of work. A fired token (explicit or by deadline)
//! surfaces as a distinct [`PipelineError::Cancelled`] so callers can tell a
//! timeout apart from a broken image.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling, JPEG and
//! PNG codecs). There are no system dependencies; the binary is
//! self-contained.

pub mod batch;
pub mod config;
pub mod export;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod stages;
pub mod tags;

pub use pipeline::{
    CancelToken, Pipeline, PipelineError, PipelineResult, Processed, Processor,
    ProcessorContext, StageError, processor_fn,
};
pub use tags::Tags;

#[cfg(test)]
pub(crate) mod test_helpers;
