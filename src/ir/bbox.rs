//! Bounding boxes in COCO's XYWH layout and YOLO's center layout.

use super::coord::Coord;
use super::space::{Normalized, Pixel};

/// An axis-aligned box stored as its top-left corner plus width and height.
///
/// This is the layout of a COCO `bbox` array. Width and height are kept as
/// given instead of being recomputed from corners, so `w / W` in the output
/// is exactly the source width divided by the image width.
///
/// Note: negative or zero sizes are representable. Out-of-range boxes are
/// converted as-is.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYWH<TSpace> {
    pub origin: Coord<TSpace>,
    pub width: f64,
    pub height: f64,
}

impl<TSpace> BBoxXYWH<TSpace> {
    /// Creates a new box from its top-left corner and size.
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Coord::new(x, y),
            width,
            height,
        }
    }

    /// Returns the right edge (`x + width`).
    #[inline]
    pub fn xmax(&self) -> f64 {
        self.origin.x + self.width
    }

    /// Returns the bottom edge (`y + height`).
    #[inline]
    pub fn ymax(&self) -> f64 {
        self.origin.y + self.height
    }

    /// Returns the midpoint between the left and right edges and between the
    /// top and bottom edges.
    #[inline]
    pub fn center(&self) -> Coord<TSpace> {
        Coord::new(
            (self.origin.x + self.xmax()) / 2.0,
            (self.origin.y + self.ymax()) / 2.0,
        )
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYWH<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYWH")
            .field("x", &self.origin.x)
            .field("y", &self.origin.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// A box in YOLO's `cx cy w h` layout.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxCXCYWH<TSpace> {
    pub center: Coord<TSpace>,
    pub width: f64,
    pub height: f64,
}

impl<TSpace> BBoxCXCYWH<TSpace> {
    /// Returns the four values in label-line order.
    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.center.x, self.center.y, self.width, self.height]
    }

    /// Returns true if all components are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.center.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

impl<TSpace> std::fmt::Debug for BBoxCXCYWH<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxCXCYWH")
            .field("cx", &self.center.x)
            .field("cy", &self.center.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl BBoxXYWH<Pixel> {
    /// Converts a pixel box to normalized YOLO center form.
    ///
    /// # Arguments
    /// * `image_width` - The width of the image in pixels
    /// * `image_height` - The height of the image in pixels
    pub fn to_normalized_cxcywh(
        &self,
        image_width: f64,
        image_height: f64,
    ) -> BBoxCXCYWH<Normalized> {
        BBoxCXCYWH {
            center: self.center().normalize(image_width, image_height),
            width: self.width / image_width,
            height: self.height / image_height,
        }
    }
}
