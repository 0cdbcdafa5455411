//! Positional train/valid/test split of an image directory and its labels.
//!
//! Images are listed in sorted order and cut at 80% and 90%:
//!
//! ```text
//! <output>/
//!   train/{images,labels}/
//!   valid/{images,labels}/
//!   test/{images,labels}/
//! ```
//!
//! Each image is copied together with the label file sharing its stem. An
//! image without a label, or a failed copy, is recorded in the
//! [`SplitReport`] and the pass moves on to the next image.

pub mod report;

pub use report::{SplitCounts, SplitFailure, SplitFailureKind, SplitReport};

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::convert::label_file_name;
use crate::error::Coco2YoloError;
use crate::progress::create_progress_bar;

/// Image extensions picked up by [`list_images`]. Matched case-sensitively.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpeg", "jpg", "png"];

const TRAIN_PERCENT: usize = 80;
const VALID_END_PERCENT: usize = 90;

const IMAGES_DIR: &str = "images";
const LABELS_DIR: &str = "labels";

/// One of the three output partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Valid, Split::Test];

    /// Directory name under the output root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Valid => "valid",
            Split::Test => "test",
        }
    }
}

/// Paths of the split tree under one output root.
#[derive(Clone, Debug)]
pub struct SplitLayout {
    root: PathBuf,
}

impl SplitLayout {
    /// Create all six `{split}/{images,labels}` directories.
    ///
    /// Each directory is created on its own, so a partially existing tree is
    /// completed rather than rejected.
    pub fn create(output_dir: &Path) -> Result<Self, Coco2YoloError> {
        let layout = Self {
            root: output_dir.to_path_buf(),
        };
        for split in Split::ALL {
            for dir in [layout.images_dir(split), layout.labels_dir(split)] {
                fs::create_dir_all(&dir)
                    .map_err(|source| Coco2YoloError::DirectoryCreate { path: dir, source })?;
            }
        }
        Ok(layout)
    }

    pub fn images_dir(&self, split: Split) -> PathBuf {
        self.root.join(split.dir_name()).join(IMAGES_DIR)
    }

    pub fn labels_dir(&self, split: Split) -> PathBuf {
        self.root.join(split.dir_name()).join(LABELS_DIR)
    }
}

/// Index boundaries of the three splits over `total` images.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitBounds {
    pub train_end: usize,
    pub valid_end: usize,
    pub total: usize,
}

impl SplitBounds {
    pub fn range(&self, split: Split) -> Range<usize> {
        match split {
            Split::Train => 0..self.train_end,
            Split::Valid => self.train_end..self.valid_end,
            Split::Test => self.valid_end..self.total,
        }
    }

    /// Split that the image at `index` falls into.
    pub fn split_for(&self, index: usize) -> Split {
        if index < self.train_end {
            Split::Train
        } else if index < self.valid_end {
            Split::Valid
        } else {
            Split::Test
        }
    }
}

/// Compute split boundaries for `total` images: `[0, ⌊0.8n⌋)`,
/// `[⌊0.8n⌋, ⌊0.9n⌋)`, `[⌊0.9n⌋, n)`.
pub fn partition(total: usize) -> SplitBounds {
    SplitBounds {
        train_end: total * TRAIN_PERCENT / 100,
        valid_end: total * VALID_END_PERCENT / 100,
        total,
    }
}

/// Regular image files directly inside `image_dir`, sorted by file name.
pub fn list_images(image_dir: &Path) -> Result<Vec<PathBuf>, Coco2YoloError> {
    if !image_dir.is_dir() {
        return Err(Coco2YoloError::ImageListing {
            path: image_dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut images = Vec::new();
    let walker = WalkDir::new(image_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|source| Coco2YoloError::ImageListing {
            path: image_dir.to_path_buf(),
            message: source.to_string(),
        })?;

        if entry.file_type().is_file() && is_image(entry.path()) {
            images.push(entry.into_path());
        }
    }

    Ok(images)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext))
}

/// Options for one split pass.
#[derive(Clone, Debug)]
pub struct SplitOptions {
    /// Root of the split tree.
    pub output_dir: PathBuf,
    pub show_progress: bool,
}

impl SplitOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            show_progress: false,
        }
    }
}

/// Copy every image in `image_dir` and its label from `label_dir` into the
/// split tree.
///
/// # Errors
/// Fails only when the split tree cannot be created or `image_dir` cannot
/// be listed. Per-image problems are recorded in the returned report.
pub fn split_dataset(
    image_dir: &Path,
    label_dir: &Path,
    options: &SplitOptions,
) -> Result<SplitReport, Coco2YoloError> {
    let start = Instant::now();
    let layout = SplitLayout::create(&options.output_dir)?;
    let images = list_images(image_dir)?;
    let bounds = partition(images.len());

    info!(
        "Splitting {} images from {}: train {}, valid {}, test {}",
        images.len(),
        image_dir.display(),
        bounds.range(Split::Train).len(),
        bounds.range(Split::Valid).len(),
        bounds.range(Split::Test).len()
    );

    let mut report = SplitReport::default();
    for split in Split::ALL {
        report.counts_mut(split).planned = bounds.range(split).len();
    }

    let pb = create_progress_bar(images.len() as u64, "Split", options.show_progress);
    for (index, image) in images.iter().enumerate() {
        let split = bounds.split_for(index);
        match place_image(image, label_dir, &layout, split) {
            Ok(()) => report.counts_mut(split).copied += 1,
            Err(failure) => {
                warn!("{}", failure);
                report.failures.push(failure);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    report.elapsed_secs = start.elapsed().as_secs_f64();
    info!(
        "Split done: {} copied, {} failure(s), {:.3}s",
        report.total_copied(),
        report.failure_count(),
        report.elapsed_secs
    );
    Ok(report)
}

fn place_image(
    image: &Path,
    label_dir: &Path,
    layout: &SplitLayout,
    split: Split,
) -> Result<(), SplitFailure> {
    let failure = |kind: SplitFailureKind, message: String| SplitFailure {
        image: image.to_path_buf(),
        split,
        kind,
        message,
    };

    let Some(image_name) = image.file_name() else {
        return Err(failure(
            SplitFailureKind::CopyFailed,
            "image path has no file name".to_string(),
        ));
    };
    let label_name = image_name
        .to_str()
        .and_then(label_file_name)
        .ok_or_else(|| {
            failure(
                SplitFailureKind::MissingLabel,
                "image file name is not valid UTF-8".to_string(),
            )
        })?;

    let label = label_dir.join(&label_name);
    if !label.is_file() {
        return Err(failure(
            SplitFailureKind::MissingLabel,
            format!("label {} not found in {}", label_name, label_dir.display()),
        ));
    }

    // Label first: an image must never land in the tree without its label.
    let label_dest = layout.labels_dir(split).join(&label_name);
    fs::copy(&label, &label_dest).map_err(|err| {
        failure(
            SplitFailureKind::CopyFailed,
            format!("copying label to {}: {}", label_dest.display(), err),
        )
    })?;

    let image_dest = layout.images_dir(split).join(image_name);
    if let Err(err) = fs::copy(image, &image_dest) {
        if let Err(remove_err) = fs::remove_file(&label_dest) {
            warn!(
                "Could not remove {} after failed image copy: {}",
                label_dest.display(),
                remove_err
            );
        }
        return Err(failure(
            SplitFailureKind::CopyFailed,
            format!("copying image to {}: {}", image_dest.display(), err),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"x").expect("write file");
    }

    #[test]
    fn partition_uses_floored_percentages() {
        assert_eq!(
            partition(100),
            SplitBounds {
                train_end: 80,
                valid_end: 90,
                total: 100
            }
        );

        let small = partition(7);
        assert_eq!(small.range(Split::Train), 0..5);
        assert_eq!(small.range(Split::Valid), 5..6);
        assert_eq!(small.range(Split::Test), 6..7);

        let empty = partition(0);
        for split in Split::ALL {
            assert!(empty.range(split).is_empty());
        }
    }

    #[test]
    fn partition_of_one_goes_to_test() {
        let bounds = partition(1);
        assert_eq!(bounds.split_for(0), Split::Test);
    }

    #[test]
    fn split_for_matches_ranges() {
        let bounds = partition(10);
        assert_eq!(bounds.split_for(0), Split::Train);
        assert_eq!(bounds.split_for(7), Split::Train);
        assert_eq!(bounds.split_for(8), Split::Valid);
        assert_eq!(bounds.split_for(9), Split::Test);
    }

    #[test]
    fn list_images_filters_and_sorts() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let dir = temp.path();
        for name in ["b.png", "a.jpg", "c.jpeg", "d.JPG", "notes.txt", "e.gif"] {
            touch(&dir.join(name));
        }
        fs::create_dir(dir.join("nested.jpg")).expect("create dir");
        fs::create_dir(dir.join("sub")).expect("create dir");
        touch(&dir.join("sub").join("deep.jpg"));

        let names: Vec<String> = list_images(dir)
            .expect("list images")
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png", "c.jpeg"]);
    }

    #[test]
    fn list_images_fails_on_missing_dir() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let err = list_images(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, Coco2YoloError::ImageListing { .. }));
    }

    #[test]
    fn layout_completes_partial_tree() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(temp.path().join("train").join("images")).expect("create dir");

        let layout = SplitLayout::create(temp.path()).expect("create layout");
        for split in Split::ALL {
            assert!(layout.images_dir(split).is_dir());
            assert!(layout.labels_dir(split).is_dir());
        }
    }

    #[test]
    fn split_copies_pairs_and_records_missing_labels() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let images = temp.path().join("images");
        let labels = temp.path().join("labels");
        fs::create_dir_all(&images).expect("create images");
        fs::create_dir_all(&labels).expect("create labels");

        for i in 0..10 {
            touch(&images.join(format!("img{i:02}.jpg")));
            if i != 3 {
                touch(&labels.join(format!("img{i:02}.txt")));
            }
        }

        let out = temp.path().join("out");
        let report =
            split_dataset(&images, &labels, &SplitOptions::new(&out)).expect("split dataset");

        assert_eq!(report.train, SplitCounts { planned: 8, copied: 7 });
        assert_eq!(report.valid, SplitCounts { planned: 1, copied: 1 });
        assert_eq!(report.test, SplitCounts { planned: 1, copied: 1 });
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failures[0].kind, SplitFailureKind::MissingLabel);
        assert_eq!(report.failures[0].split, Split::Train);

        assert!(!out.join("train/images/img03.jpg").exists());
        assert!(out.join("train/images/img02.jpg").is_file());
        assert!(out.join("train/labels/img02.txt").is_file());
        assert!(out.join("valid/images/img08.jpg").is_file());
        assert!(out.join("test/labels/img09.txt").is_file());
    }

    #[test]
    fn failed_label_copy_leaves_no_image_behind() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let images = temp.path().join("images");
        let labels = temp.path().join("labels");
        fs::create_dir_all(&images).expect("create images");
        touch(&images.join("a.jpg"));
        fs::create_dir_all(&labels).expect("create labels");
        touch(&labels.join("a.txt"));

        // A directory where the label should go makes the label copy fail.
        let out = temp.path().join("out");
        fs::create_dir_all(out.join("test/labels/a.txt")).expect("create blocking dir");

        let report =
            split_dataset(&images, &labels, &SplitOptions::new(&out)).expect("split dataset");

        assert_eq!(report.test, SplitCounts { planned: 1, copied: 0 });
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, SplitFailureKind::CopyFailed);
        assert!(report.failures[0].message.contains("copying label"));
        assert!(!out.join("test/images/a.jpg").exists());
    }

    #[test]
    fn failed_image_copy_removes_copied_label() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let images = temp.path().join("images");
        let labels = temp.path().join("labels");
        fs::create_dir_all(&images).expect("create images");
        touch(&images.join("a.jpg"));
        fs::create_dir_all(&labels).expect("create labels");
        touch(&labels.join("a.txt"));

        let out = temp.path().join("out");
        fs::create_dir_all(out.join("test/images/a.jpg")).expect("create blocking dir");

        let report =
            split_dataset(&images, &labels, &SplitOptions::new(&out)).expect("split dataset");

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, SplitFailureKind::CopyFailed);
        assert!(report.failures[0].message.contains("copying image"));
        assert!(!out.join("test/labels/a.txt").exists());
    }
}
