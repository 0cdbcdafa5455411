//! Split report types.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use super::Split;

/// Planned and copied counts for one split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitCounts {
    /// Images assigned to this split by position.
    pub planned: usize,
    /// Image/label pairs actually copied.
    pub copied: usize,
}

/// Summary of one split pass.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SplitReport {
    pub train: SplitCounts,
    pub valid: SplitCounts,
    pub test: SplitCounts,
    pub failures: Vec<SplitFailure>,
    pub elapsed_secs: f64,
}

impl SplitReport {
    pub fn counts(&self, split: Split) -> &SplitCounts {
        match split {
            Split::Train => &self.train,
            Split::Valid => &self.valid,
            Split::Test => &self.test,
        }
    }

    pub fn counts_mut(&mut self, split: Split) -> &mut SplitCounts {
        match split {
            Split::Train => &mut self.train,
            Split::Valid => &mut self.valid,
            Split::Test => &mut self.test,
        }
    }

    /// Total images listed in the image directory.
    pub fn total_planned(&self) -> usize {
        self.train.planned + self.valid.planned + self.test.planned
    }

    /// Total image/label pairs copied.
    pub fn total_copied(&self) -> usize {
        self.train.copied + self.valid.copied + self.test.copied
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for SplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Split {} of {} images",
            self.total_copied(),
            self.total_planned()
        )?;
        for split in Split::ALL {
            let counts = self.counts(split);
            writeln!(
                f,
                "  {:<5}: {} copied / {} planned",
                split.dir_name(),
                counts.copied,
                counts.planned
            )?;
        }
        writeln!(f, "  elapsed: {:.3}s", self.elapsed_secs)?;

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failures ({}):", self.failure_count())?;
            for failure in &self.failures {
                writeln!(f, "  - {}", failure)?;
            }
        }

        Ok(())
    }
}

/// One image that could not be placed into its split.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SplitFailure {
    pub image: PathBuf,
    pub split: Split,
    pub kind: SplitFailureKind,
    pub message: String,
}

impl fmt::Display for SplitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.kind.as_str(),
            self.image.display(),
            self.split.dir_name(),
            self.message
        )
    }
}

/// Stable failure codes for programmatic consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitFailureKind {
    /// No `<stem>.txt` next to the converted labels; the image was not copied.
    MissingLabel,
    /// Copying the image or its label failed.
    CopyFailed,
}

impl SplitFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitFailureKind::MissingLabel => "missing_label",
            SplitFailureKind::CopyFailed => "copy_failed",
        }
    }
}
