//! In-memory model of a COCO annotation document.
//!
//! Images are strict: their id, file name and size are needed for every
//! label file, so a malformed image entry fails the whole read. Annotations
//! are permissive: each geometry field is kept as the raw JSON value and only
//! checked when a conversion mode asks for it, so one bad record never takes
//! down the run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::bbox::BBoxXYWH;
use super::coord::Coord;
use super::ids::{CategoryId, ImageId};
use super::space::Pixel;

/// A COCO document, loaded once and held for the whole conversion pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CocoDocument {
    /// Entries of the COCO `images` array, in document order.
    pub images: Vec<ImageInfo>,

    /// Entries of the COCO `annotations` array, in document order.
    pub annotations: Vec<AnnotationRecord>,

    /// Entries of the COCO `categories` array that have an id and a name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryInfo>,
}

impl CocoDocument {
    /// Looks up the display name of a category, if the document declares it.
    pub fn category_name(&self, id: CategoryId) -> Option<&str> {
        self.categories
            .iter()
            .find(|cat| cat.id == id)
            .map(|cat| cat.name.as_str())
    }
}

/// An image in the document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Unique identifier for this image within the document.
    pub id: ImageId,

    /// File name of the image; its stem names the label file.
    pub file_name: String,

    /// Width in pixels, the x normalization denominator.
    pub width: f64,

    /// Height in pixels, the y normalization denominator.
    pub height: f64,
}

impl ImageInfo {
    /// Creates a new image with the given properties.
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
        }
    }

    /// Returns true if both dimensions can be used as denominators.
    pub fn has_usable_size(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A category declared in the document's `categories` array.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: CategoryId,
    pub name: String,
}

impl CategoryInfo {
    /// Creates a new category.
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Why a field of an [`AnnotationRecord`] could not be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// The key is absent or `null`.
    Missing,
    /// The key is present but has the wrong shape.
    Malformed,
}

/// An annotation, with every field kept as raw JSON until it is needed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnnotationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Value>,

    /// COCO `[x, y, width, height]`, used in detection mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Value>,

    /// COCO polygon list, used in segmentation mode (first ring only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<Value>,
}

impl AnnotationRecord {
    /// Creates a well-formed record with a bbox and no segmentation.
    pub fn with_bbox(image_id: u64, category_id: i64, bbox: [f64; 4]) -> Self {
        Self {
            image_id: Some(Value::from(image_id)),
            category_id: Some(Value::from(category_id)),
            bbox: Some(Value::from(bbox.to_vec())),
            segmentation: None,
        }
    }

    /// Creates a well-formed record with a single polygon and no bbox.
    pub fn with_polygon(image_id: u64, category_id: i64, polygon: &[f64]) -> Self {
        Self {
            image_id: Some(Value::from(image_id)),
            category_id: Some(Value::from(category_id)),
            bbox: None,
            segmentation: Some(Value::Array(vec![Value::from(polygon.to_vec())])),
        }
    }

    /// The image this record belongs to.
    pub fn image_id(&self) -> Result<ImageId, FieldError> {
        let value = present(&self.image_id)?;
        let id = as_integer(value).ok_or(FieldError::Malformed)?;
        u64::try_from(id)
            .map(ImageId::new)
            .map_err(|_| FieldError::Malformed)
    }

    /// The COCO category of this record.
    pub fn category_id(&self) -> Result<CategoryId, FieldError> {
        let value = present(&self.category_id)?;
        as_integer(value)
            .map(CategoryId::new)
            .ok_or(FieldError::Malformed)
    }

    /// The `bbox` field as a pixel box. Must be exactly four numbers.
    pub fn bbox(&self) -> Result<BBoxXYWH<Pixel>, FieldError> {
        let value = present(&self.bbox)?;
        let items = value.as_array().ok_or(FieldError::Malformed)?;
        match numbers(items).as_deref() {
            Some(&[x, y, w, h]) => Ok(BBoxXYWH::from_xywh(x, y, w, h)),
            _ => Err(FieldError::Malformed),
        }
    }

    /// The first polygon ring of `segmentation` as pixel points.
    ///
    /// The ring must be a non-empty flat list of numbers with an even
    /// length. RLE objects and empty lists are malformed.
    pub fn first_polygon(&self) -> Result<Vec<Coord<Pixel>>, FieldError> {
        let value = present(&self.segmentation)?;
        let rings = value.as_array().ok_or(FieldError::Malformed)?;
        let ring = rings
            .first()
            .ok_or(FieldError::Missing)?
            .as_array()
            .ok_or(FieldError::Malformed)?;

        let flat = numbers(ring).ok_or(FieldError::Malformed)?;
        if flat.is_empty() || flat.len() % 2 != 0 {
            return Err(FieldError::Malformed);
        }

        Ok(flat
            .chunks_exact(2)
            .map(|pair| Coord::new(pair[0], pair[1]))
            .collect())
    }
}

fn present(field: &Option<Value>) -> Result<&Value, FieldError> {
    match field {
        None | Some(Value::Null) => Err(FieldError::Missing),
        Some(value) => Ok(value),
    }
}

/// Accepts JSON integers and floats with no fractional part.
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(id) = value.as_i64() {
        return Some(id);
    }
    let float = value.as_f64()?;
    if float.is_finite() && float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
        Some(float as i64)
    } else {
        None
    }
}

fn numbers(items: &[Value]) -> Option<Vec<f64>> {
    items.iter().map(Value::as_f64).collect()
}
