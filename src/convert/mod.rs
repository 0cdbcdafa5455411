//! COCO to YOLO label conversion.
//!
//! Conversion runs in two steps:
//!
//! 1. [`convert_document`] is pure. It groups annotations by image in one
//!    pass, then visits images in document order and each image's
//!    annotations in document order, assigning class ids and building label
//!    lines. Visiting order is what defines class numbering under
//!    [`ClassIdPolicy::EncounterOrder`].
//! 2. [`write_label_files`] writes one `<stem>.txt` per image, truncating any
//!    existing file, so repeated runs over the same input are idempotent.

pub mod remap;
pub mod report;

pub use remap::{CategoryRemap, ClassIdPolicy};
pub use report::{AnnotationSkip, ClassEntry, ConversionReport, SkipReason};

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

use log::{debug, info, warn};

use crate::error::Coco2YoloError;
use crate::ir::io_coco_json::read_coco_json;
use crate::ir::{AnnotationRecord, ClassId, CocoDocument, FieldError, ImageId, ImageInfo};
use crate::progress::create_progress_bar;

const LABEL_EXTENSION: &str = "txt";

/// Which YOLO label flavour to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversionMode {
    /// `class cx cy w h` from the COCO `bbox`.
    Detection,
    /// `class x0 y0 x1 y1 ...` from the first COCO polygon.
    Segmentation,
}

impl ConversionMode {
    /// Human-readable name for the mode.
    pub fn name(&self) -> &'static str {
        match self {
            ConversionMode::Detection => "detection",
            ConversionMode::Segmentation => "segmentation",
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConversionMode {
    type Err = Coco2YoloError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "detection" => Ok(ConversionMode::Detection),
            "segmentation" => Ok(ConversionMode::Segmentation),
            other => Err(Coco2YoloError::InvalidMode(other.to_string())),
        }
    }
}

/// Options for one conversion pass.
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    pub mode: ConversionMode,
    pub class_id_policy: ClassIdPolicy,
    /// Fixed number of decimals; `None` prints the shortest round-trip form.
    pub precision: Option<usize>,
    pub show_progress: bool,
}

impl ConvertOptions {
    /// Options with the default class policy, shortest number formatting and
    /// no progress bar.
    pub fn new(mode: ConversionMode) -> Self {
        Self {
            mode,
            class_id_policy: ClassIdPolicy::default(),
            precision: None,
            show_progress: false,
        }
    }
}

/// The label file for one image, not yet written.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelFile {
    pub image_id: ImageId,
    /// File name inside the output directory, e.g. `000000000139.txt`.
    pub file_name: String,
    pub lines: Vec<String>,
}

impl LabelFile {
    /// File contents: every line terminated by `\n`; empty when there are no lines.
    pub fn contents(&self) -> String {
        let mut contents = String::new();
        for line in &self.lines {
            contents.push_str(line);
            contents.push('\n');
        }
        contents
    }
}

/// Label file name for an image: the final path component with its last
/// extension replaced by `.txt`.
///
/// Returns `None` when the name has no usable stem (e.g. empty).
pub fn label_file_name(image_file_name: &str) -> Option<String> {
    let stem = Path::new(image_file_name).file_stem()?.to_str()?;
    Some(format!("{}.{}", stem, LABEL_EXTENSION))
}

/// Build label files for every image in the document, without touching disk.
pub fn convert_document(
    document: &CocoDocument,
    options: &ConvertOptions,
) -> (Vec<LabelFile>, ConversionReport) {
    let mut report = ConversionReport::new(options.mode.name());
    report.images = document.images.len();
    report.annotations = document.annotations.len();

    let known_images: HashSet<ImageId> = document.images.iter().map(|img| img.id).collect();

    let mut annotations_by_image: HashMap<ImageId, Vec<usize>> = HashMap::new();
    for (index, ann) in document.annotations.iter().enumerate() {
        match ann.image_id() {
            Ok(image_id) if known_images.contains(&image_id) => {
                annotations_by_image.entry(image_id).or_default().push(index);
            }
            _ => report.orphaned_annotations += 1,
        }
    }

    let mut remap = CategoryRemap::new(options.class_id_policy);
    let mut files = Vec::with_capacity(document.images.len());
    let pb = create_progress_bar(
        document.images.len() as u64,
        "Convert",
        options.show_progress,
    );

    for image in &document.images {
        let mut lines = Vec::new();

        if let Some(indices) = annotations_by_image.get(&image.id) {
            for &index in indices {
                let ann = &document.annotations[index];
                match build_label_line(ann, image, &mut remap, options) {
                    Ok(line) => lines.push(line),
                    Err(reason) => {
                        debug!(
                            "Skipping annotation #{} on image {}: {}",
                            index,
                            image.id,
                            reason.description()
                        );
                        report.skip(AnnotationSkip {
                            annotation_index: index,
                            image_id: image.id,
                            reason,
                        });
                    }
                }
            }
        }

        let file_name = label_file_name(&image.file_name).unwrap_or_else(|| {
            warn!(
                "Image {} has no usable file name '{}'; naming its labels by id",
                image.id, image.file_name
            );
            format!("{}.{}", image.id, LABEL_EXTENSION)
        });

        report.lines += lines.len();
        files.push(LabelFile {
            image_id: image.id,
            file_name,
            lines,
        });
        pb.inc(1);
    }
    pb.finish_and_clear();

    report.label_files = files.len();
    report.classes = remap
        .classes()
        .into_iter()
        .map(|(class_id, category_id)| ClassEntry {
            class_id,
            category_id,
            name: document.category_name(category_id).map(str::to_string),
        })
        .collect();

    (files, report)
}

/// Build the label line for one annotation on one image.
///
/// The class id is assigned before the geometry is checked, so a category
/// is registered even when its first annotation is then skipped.
fn build_label_line(
    ann: &AnnotationRecord,
    image: &ImageInfo,
    remap: &mut CategoryRemap,
    options: &ConvertOptions,
) -> Result<String, SkipReason> {
    let category = ann.category_id().map_err(|err| match err {
        FieldError::Missing => SkipReason::MissingCategoryId,
        FieldError::Malformed => SkipReason::MalformedCategoryId,
    })?;
    let class_id = remap
        .class_id(category)
        .ok_or(SkipReason::NegativeClassId)?;

    if !image.has_usable_size() {
        return Err(SkipReason::InvalidImageSize);
    }

    let values: Vec<f64> = match options.mode {
        ConversionMode::Detection => {
            let bbox = ann.bbox().map_err(|err| match err {
                FieldError::Missing => SkipReason::MissingBbox,
                FieldError::Malformed => SkipReason::MalformedBbox,
            })?;
            let normalized = bbox.to_normalized_cxcywh(image.width, image.height);
            if !normalized.is_finite() {
                return Err(SkipReason::NonFiniteCoordinates);
            }
            normalized.to_array().to_vec()
        }
        ConversionMode::Segmentation => {
            let polygon = ann.first_polygon().map_err(|err| match err {
                FieldError::Missing => SkipReason::MissingSegmentation,
                FieldError::Malformed => SkipReason::MalformedSegmentation,
            })?;
            let normalized: Vec<_> = polygon
                .iter()
                .map(|point| point.normalize(image.width, image.height))
                .collect();
            if !normalized.iter().all(|point| point.is_finite()) {
                return Err(SkipReason::NonFiniteCoordinates);
            }
            normalized
                .iter()
                .flat_map(|point| [point.x, point.y])
                .collect()
        }
    };

    Ok(format_label_line(class_id, &values, options.precision))
}

/// Format `class v1 v2 ...`, space-separated.
pub fn format_label_line(class_id: ClassId, values: &[f64], precision: Option<usize>) -> String {
    let mut line = class_id.to_string();
    for value in values {
        line.push(' ');
        match precision {
            Some(digits) => line.push_str(&format!("{:.*}", digits, value)),
            None => line.push_str(&value.to_string()),
        }
    }
    line
}

/// Write label files into `output_dir`, creating it if absent.
///
/// Existing files are truncated. When two images map to the same file name
/// the later one wins and a warning is logged.
pub fn write_label_files(output_dir: &Path, files: &[LabelFile]) -> Result<usize, Coco2YoloError> {
    if output_dir.is_dir() {
        info!("Saving labels to {}", output_dir.display());
    } else {
        info!(
            "Output directory {} not found, creating it",
            output_dir.display()
        );
        fs::create_dir_all(output_dir).map_err(|source| Coco2YoloError::DirectoryCreate {
            path: output_dir.to_path_buf(),
            source,
        })?;
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(files.len());
    for file in files {
        if !seen.insert(file.file_name.as_str()) {
            warn!(
                "Label file {} is shared by more than one image; image {} overwrites it",
                file.file_name, file.image_id
            );
        }

        let path = output_dir.join(&file.file_name);
        fs::write(&path, file.contents())
            .map_err(|source| Coco2YoloError::LabelWrite { path, source })?;
    }

    Ok(files.len())
}

/// Convert an in-memory document and write its label files.
pub fn convert_coco_to_yolo(
    document: &CocoDocument,
    output_dir: &Path,
    options: &ConvertOptions,
) -> Result<ConversionReport, Coco2YoloError> {
    let start = Instant::now();
    info!(
        "Converting {} images, {} annotations ({} mode)",
        document.images.len(),
        document.annotations.len(),
        options.mode
    );

    let (files, mut report) = convert_document(document, options);
    write_label_files(output_dir, &files)?;

    report.elapsed_secs = start.elapsed().as_secs_f64();
    info!(
        "Conversion done: {} label files, {} skipped annotation(s), {:.3}s",
        report.label_files,
        report.skip_count(),
        report.elapsed_secs
    );
    Ok(report)
}

/// Read a COCO JSON file and convert it.
pub fn convert_coco_file(
    coco_path: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
) -> Result<ConversionReport, Coco2YoloError> {
    let document = read_coco_json(coco_path)?;
    convert_coco_to_yolo(&document, output_dir, options)
}
