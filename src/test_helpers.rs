//! Shared test utilities.
//!
//! Images are generated, not loaded: [`sample_image`] draws a deterministic
//! gradient with pseudo-random grain so lossy codecs have real detail to
//! throw away, without shipping binary fixtures.
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let out = process_original(&Tagger::fixed(Tags::new(["foo"])), sample_image(64, 48))?;
//! assert_eq!(out.len(), 1);
//! ```

use crate::pipeline::{CancelToken, Processed, Processor, ProcessorContext, StageError};
use image::{Rgba, RgbaImage};

/// Deterministic `width`x`height` test image: diagonal gradient plus grain.
pub fn sample_image(width: u32, height: u32) -> RgbaImage {
    let mut state: u32 = 0x2545_f491;
    RgbaImage::from_fn(width, height, |x, y| {
        // xorshift32
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let grain = (state % 64) as i32 - 32;

        let gx = (x * 255 / width.max(1)) as i32;
        let gy = (y * 255 / height.max(1)) as i32;
        let channel = |base: i32| (base + grain).clamp(0, 255) as u8;
        Rgba([channel(gx), channel(gy), channel((gx + gy) / 2), 255])
    })
}

/// Run `processor` on a fresh original image with a live cancel token.
pub fn process_original(
    processor: &impl Processor,
    image: RgbaImage,
) -> Result<Vec<Processed>, StageError> {
    let token = CancelToken::new();
    let input = Processed::original(image);
    processor.process(&ProcessorContext::new(&token, &input))
}
