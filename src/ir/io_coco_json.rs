//! COCO JSON reader.
//!
//! # COCO Format Reference
//!
//! A COCO document is one JSON object with global `images`, `annotations`
//! and `categories` arrays. Bounding boxes use `[x, y, width, height]` with
//! `(x, y)` as the top-left corner in absolute pixels; polygons are flat
//! `[x0, y0, x1, y1, ...]` lists, also in pixels. Category ids are 1-based
//! by convention.
//!
//! Only `images` and `annotations` are required. Categories without an
//! integer id and a string name are dropped silently, since they only feed
//! the class names in `data.yaml`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::model::{AnnotationRecord, CategoryInfo, CocoDocument, ImageInfo};
use super::CategoryId;
use crate::error::Coco2YoloError;

// ============================================================================
// COCO Schema Types (internal to this module)
// ============================================================================

/// Top-level COCO dataset structure.
#[derive(Debug, Deserialize)]
struct CocoDataset {
    images: Vec<ImageInfo>,

    annotations: Vec<AnnotationRecord>,

    #[serde(default)]
    categories: Vec<Value>,
}

// ============================================================================
// Public API
// ============================================================================

/// Reads a COCO JSON file.
///
/// # Errors
/// Returns [`Coco2YoloError::DocumentOpen`] if the file cannot be opened and
/// [`Coco2YoloError::DocumentParse`] if it is not a COCO-shaped JSON object.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use coco2yolo::ir::io_coco_json::read_coco_json;
///
/// let document = read_coco_json(Path::new("instances_val2017.json"))?;
/// println!("{} images", document.images.len());
/// # Ok::<(), coco2yolo::Coco2YoloError>(())
/// ```
pub fn read_coco_json(path: &Path) -> Result<CocoDocument, Coco2YoloError> {
    let file = File::open(path).map_err(|source| Coco2YoloError::DocumentOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let coco: CocoDataset =
        serde_json::from_reader(reader).map_err(|source| Coco2YoloError::DocumentParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(into_document(coco))
}

/// Reads a COCO document from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_coco_str(json: &str) -> Result<CocoDocument, serde_json::Error> {
    let coco: CocoDataset = serde_json::from_str(json)?;
    Ok(into_document(coco))
}

/// Reads a COCO document from a JSON byte slice.
///
/// Useful for fuzzing and processing raw bytes without UTF-8 validation overhead.
pub fn from_coco_slice(bytes: &[u8]) -> Result<CocoDocument, serde_json::Error> {
    let coco: CocoDataset = serde_json::from_slice(bytes)?;
    Ok(into_document(coco))
}

// ============================================================================
// Conversion: COCO schema -> document model
// ============================================================================

fn into_document(coco: CocoDataset) -> CocoDocument {
    let categories = coco
        .categories
        .iter()
        .filter_map(|raw| {
            let id = raw.get("id")?.as_i64()?;
            let name = raw.get("name")?.as_str()?;
            Some(CategoryInfo {
                id: CategoryId::new(id),
                name: name.to_string(),
            })
        })
        .collect();

    CocoDocument {
        images: coco.images,
        annotations: coco.annotations,
        categories,
    }
}

// ============================================================================
// Tests
// ============================================================================
