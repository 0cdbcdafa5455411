//! Conversion report types.
//!
//! A report records what one conversion pass produced and, for every
//! annotation that contributed no label line, the named reason it was
//! skipped. Skips are part of normal operation and never fail a run.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::ir::{CategoryId, ClassId, ImageId};

/// Summary of one conversion pass.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Conversion mode name ("detection" or "segmentation").
    pub mode: String,
    /// Number of entries in the document's `images` array.
    pub images: usize,
    /// Number of entries in the document's `annotations` array.
    pub annotations: usize,
    /// Label files written (one per image).
    pub label_files: usize,
    /// Label lines written across all files.
    pub lines: usize,
    /// Annotations whose `image_id` matches no image.
    pub orphaned_annotations: usize,
    /// Class table, ordered by class id.
    pub classes: Vec<ClassEntry>,
    /// Annotations that matched an image but produced no line.
    pub skipped: Vec<AnnotationSkip>,
    /// Wall-clock time of the pass, in seconds.
    pub elapsed_secs: f64,
}

impl ConversionReport {
    /// Create a new empty report for the given mode.
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            ..Default::default()
        }
    }

    /// Record a skipped annotation.
    pub fn skip(&mut self, skip: AnnotationSkip) {
        self.skipped.push(skip);
    }

    /// Total number of skipped annotations.
    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }

    /// Skipped annotations grouped by reason.
    pub fn skip_counts(&self) -> BTreeMap<SkipReason, usize> {
        let mut counts = BTreeMap::new();
        for skip in &self.skipped {
            *counts.entry(skip.reason).or_insert(0) += 1;
        }
        counts
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Converted {} images, {} annotations ({} mode)",
            self.images, self.annotations, self.mode
        )?;
        writeln!(
            f,
            "  {} label files, {} lines, {} classes",
            self.label_files,
            self.lines,
            self.classes.len()
        )?;
        writeln!(f, "  elapsed: {:.3}s", self.elapsed_secs)?;

        if self.orphaned_annotations > 0 {
            writeln!(
                f,
                "  {} annotation(s) reference no known image",
                self.orphaned_annotations
            )?;
        }

        if !self.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped annotations ({}):", self.skip_count())?;
            for (reason, count) in self.skip_counts() {
                writeln!(f, "  - {}: {}", reason.description(), count)?;
            }
        }

        Ok(())
    }
}

/// One row of the class table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassEntry {
    pub class_id: ClassId,
    pub category_id: CategoryId,
    /// Category name from the document, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ClassEntry {
    /// The declared category name, or `class_<id>` when there is none.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("class_{}", self.class_id))
    }
}

/// An annotation that contributed no label line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnnotationSkip {
    /// Position in the document's `annotations` array.
    pub annotation_index: usize,
    pub image_id: ImageId,
    pub reason: SkipReason,
}

/// Stable skip codes for programmatic consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// `category_id` is absent or null.
    MissingCategoryId,
    /// `category_id` is not an integer.
    MalformedCategoryId,
    /// `category_id - 1` is negative and class ids are taken from it directly.
    NegativeClassId,
    /// Image width or height is zero, negative or not finite.
    InvalidImageSize,
    /// Detection mode: `bbox` is absent or null.
    MissingBbox,
    /// Detection mode: `bbox` is not exactly four numbers.
    MalformedBbox,
    /// Segmentation mode: `segmentation` is absent, null or has no rings.
    MissingSegmentation,
    /// Segmentation mode: first ring is not a non-empty, even-length list of numbers.
    MalformedSegmentation,
    /// Normalizing the geometry overflowed to an infinite or NaN value.
    NonFiniteCoordinates,
}

impl SkipReason {
    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            SkipReason::MissingCategoryId => "missing category_id",
            SkipReason::MalformedCategoryId => "non-integer category_id",
            SkipReason::NegativeClassId => "category_id below 1",
            SkipReason::InvalidImageSize => "image has unusable width/height",
            SkipReason::MissingBbox => "missing bbox",
            SkipReason::MalformedBbox => "bbox is not [x, y, w, h]",
            SkipReason::MissingSegmentation => "missing segmentation polygon",
            SkipReason::MalformedSegmentation => "segmentation polygon is not a flat x,y list",
            SkipReason::NonFiniteCoordinates => "normalized coordinates are not finite",
        }
    }
}
