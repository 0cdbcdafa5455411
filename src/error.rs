use std::path::PathBuf;
use thiserror::Error;

use crate::split::SplitReport;

/// The main error type for coco2yolo operations.
#[derive(Debug, Error)]
pub enum Coco2YoloError {
    #[error("Failed to open COCO annotations {path}: {source}")]
    DocumentOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse COCO annotations from {path}: {source}")]
    DocumentParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid conversion mode '{0}' (supported: detection, segmentation)")]
    InvalidMode(String),

    #[error("Invalid class id policy '{0}' (supported: encounter, category)")]
    InvalidClassIdPolicy(String),

    #[error("Unsupported report format '{0}' (supported: text, json)")]
    UnsupportedReportFormat(String),

    #[error("Failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write label file {path}: {source}")]
    LabelWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list images in {path}: {message}")]
    ImageListing { path: PathBuf, message: String },

    #[error("Failed to write data.yaml to {path}: {source}")]
    DataYamlWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize data.yaml: {0}")]
    DataYamlSerialize(#[source] serde_yaml::Error),

    #[error("Failed to serialize report: {0}")]
    ReportSerialize(#[source] serde_json::Error),

    #[error("Split finished with {failure_count} failure(s)")]
    SplitIncomplete {
        failure_count: usize,
        report: Box<SplitReport>,
    },
}
