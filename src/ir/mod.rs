//! Typed model of the COCO input.
//!
//! # Design Principles
//!
//! 1. **Type Safety**: newtype ids keep COCO category ids apart from YOLO
//!    class ids, and marker types keep pixel values apart from normalized
//!    ones.
//!
//! 2. **Permissive Annotations**: annotation fields are held as raw JSON and
//!    checked on access, so a malformed record can be skipped with a reason
//!    instead of failing the whole document.
//!
//! # Example
//!
//! ```
//! use coco2yolo::ir::{AnnotationRecord, CocoDocument, ImageInfo};
//!
//! let document = CocoDocument {
//!     images: vec![ImageInfo::new(1u64, "image.jpg", 640.0, 480.0)],
//!     annotations: vec![AnnotationRecord::with_bbox(1, 1, [10.0, 20.0, 100.0, 200.0])],
//!     ..Default::default()
//! };
//! assert!(document.annotations[0].bbox().is_ok());
//! ```

mod bbox;
mod coord;
mod ids;
pub mod io_coco_json;
mod model;
mod space;

// Re-export core types for convenient access
pub use bbox::{BBoxCXCYWH, BBoxXYWH};
pub use coord::Coord;
pub use ids::{CategoryId, ClassId, ImageId};
pub use model::{AnnotationRecord, CategoryInfo, CocoDocument, FieldError, ImageInfo};
pub use space::{Normalized, Pixel};
