//! Coordinate space marker types.
//!
//! These are zero-sized types (ZSTs) used as type parameters to distinguish
//! COCO's pixel-absolute values from YOLO's normalized fractions at compile
//! time.

use std::fmt;

/// Marker type for pixel coordinates (absolute values).
///
/// COCO `bbox` and `segmentation` values live in this space, with (0, 0) at
/// the top-left corner of the image.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker type for normalized coordinates (fractions of width/height).
///
/// Values are nominally in [0, 1]. Out-of-range source data is carried
/// through unchanged rather than clamped.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {} // This is unreachable since Pixel has no variants
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {} // This is unreachable since Normalized has no variants
    }
}
