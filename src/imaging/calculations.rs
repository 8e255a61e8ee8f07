//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use std::cmp::Ordering;

/// Resolve a requested target against the source size.
///
/// A zero height is derived from the width preserving the source aspect
/// ratio, and a zero width from the height. Derived edges are never smaller
/// than one pixel. Returns `None` when both edges are zero or the source is
/// empty.
///
/// # Examples
/// ```
/// # use image_variants::imaging::{Dimensions, resolve_target};
/// // 800x600 → width 400, height derived → 400x300
/// assert_eq!(resolve_target((800, 600), Dimensions::width(400)), Some((400, 300)));
/// ```
pub fn resolve_target(source: (u32, u32), target: Dimensions) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return None;
    }

    match (target.width, target.height) {
        (0, 0) => None,
        (w, 0) => {
            let h = (w as f64 * src_h as f64 / src_w as f64).round() as u32;
            Some((w, h.max(1)))
        }
        (0, h) => {
            let w = (h as f64 * src_w as f64 / src_h as f64).round() as u32;
            Some((w.max(1), h))
        }
        (w, h) => Some((w, h)),
    }
}

/// Ordering used for deterministic output: width ascending, then height.
pub fn compare_dimensions(a: &Dimensions, b: &Dimensions) -> Ordering {
    a.width.cmp(&b.width).then(a.height.cmp(&b.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_target_is_kept() {
        assert_eq!(
            resolve_target((800, 600), Dimensions::new(300, 500)),
            Some((300, 500))
        );
    }

    #[test]
    fn zero_height_preserves_aspect_landscape() {
        // 4:3 → 640 wide is 480 tall
        assert_eq!(
            resolve_target((800, 600), Dimensions::width(640)),
            Some((640, 480))
        );
    }

    #[test]
    fn zero_height_preserves_aspect_portrait() {
        assert_eq!(
            resolve_target((600, 800), Dimensions::width(300)),
            Some((300, 400))
        );
    }

    #[test]
    fn zero_width_derives_from_height() {
        assert_eq!(
            resolve_target((800, 600), Dimensions::new(0, 300)),
            Some((400, 300))
        );
    }

    #[test]
    fn derived_edge_is_at_least_one_pixel() {
        assert_eq!(
            resolve_target((1000, 1), Dimensions::width(10)),
            Some((10, 1))
        );
    }

    #[test]
    fn both_zero_is_rejected() {
        assert_eq!(resolve_target((800, 600), Dimensions::new(0, 0)), None);
    }

    #[test]
    fn empty_source_is_rejected() {
        assert_eq!(resolve_target((0, 600), Dimensions::width(10)), None);
    }

    #[test]
    fn compare_orders_by_width_then_height() {
        let mut dims = vec![
            Dimensions::new(300, 500),
            Dimensions::width(960),
            Dimensions::new(100, 100),
            Dimensions::new(300, 200),
        ];
        dims.sort_by(compare_dimensions);
        assert_eq!(
            dims,
            vec![
                Dimensions::new(100, 100),
                Dimensions::new(300, 200),
                Dimensions::new(300, 500),
                Dimensions::width(960),
            ]
        );
    }
}
