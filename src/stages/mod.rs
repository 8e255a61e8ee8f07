//! Built-in pipeline stages.
//!
//! | Stage | Fan-out | Tags added |
//! |---|---|---|
//! | [`Resizer`] | input (optional) + one per size | `resized`, `size=<name>` |
//! | [`Compressor`] | one per compression (original passed through by default) | `compressed`, compression tags |
//! | [`Tagger`] | exactly one | configured tags |

mod compress;
mod resize;
mod tag;

pub use compress::{Compression, Compressor};
pub use resize::{DimensionProvider, Resizer, dimension_name};
pub use tag::Tagger;
