//! coco2yolo: COCO annotations to YOLO label files.
//!
//! The crate converts a COCO JSON document into one YOLO `.txt` label file
//! per image, then splits the image directory 80/10/10 into
//! `train/valid/test` trees with a matching `data.yaml`.
//!
//! # Modules
//!
//! - [`ir`]: typed COCO model and the JSON reader
//! - [`convert`]: label-line construction and class id remapping
//! - [`split`]: positional train/valid/test split
//! - [`data_yaml`]: Ultralytics dataset descriptor
//! - [`error`]: error types for coco2yolo operations

pub mod convert;
pub mod data_yaml;
pub mod error;
pub mod ir;
pub mod progress;
pub mod split;

use std::path::PathBuf;

use clap::Parser;
use log::info;
use serde::Serialize;

use convert::{ClassIdPolicy, ConversionMode, ConversionReport, ConvertOptions};
use split::{SplitOptions, SplitReport};

pub use error::Coco2YoloError;

/// The coco2yolo CLI application.
#[derive(Parser)]
#[command(name = "coco2yolo")]
#[command(version, author, about)]
struct Cli {
    /// COCO annotations JSON file.
    #[arg(short = 'a', long, env = "COCO2YOLO_ANNOTATIONS")]
    coco_annotations: PathBuf,

    /// Directory holding the images referenced by the annotations.
    #[arg(short = 'i', long, env = "COCO2YOLO_IMAGES")]
    images: PathBuf,

    /// Directory for the YOLO label files and the split tree.
    #[arg(short = 'o', long, env = "COCO2YOLO_OUTPUT")]
    output: PathBuf,

    /// Conversion mode ('detection' or 'segmentation').
    #[arg(short = 'm', long)]
    mode: String,

    /// Class id numbering ('encounter' or 'category').
    #[arg(long, default_value = "encounter")]
    class_ids: String,

    /// Print coordinates with this many decimals instead of the shortest form.
    #[arg(long)]
    precision: Option<usize>,

    /// Only write label files; skip the train/valid/test split.
    #[arg(long)]
    no_split: bool,

    /// Output format for the final report ('text' or 'json').
    #[arg(long, default_value = "text")]
    report: String,

    /// Hide progress bars.
    #[arg(short = 'q', long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    fn parse(value: &str) -> Result<Self, Coco2YoloError> {
        match value {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(Coco2YoloError::UnsupportedReportFormat(other.to_string())),
        }
    }
}

/// Everything a run produced, for `--report json`.
#[derive(Serialize)]
struct RunReport<'a> {
    conversion: &'a ConversionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    split: Option<&'a SplitReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_yaml: Option<&'a PathBuf>,
}

/// Run the coco2yolo CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), Coco2YoloError> {
    let cli = Cli::parse();

    // Reject bad option values before any file is touched.
    let mode: ConversionMode = cli.mode.parse()?;
    let class_id_policy: ClassIdPolicy = cli.class_ids.parse()?;
    let report_format = ReportFormat::parse(&cli.report)?;

    let options = ConvertOptions {
        mode,
        class_id_policy,
        precision: cli.precision,
        show_progress: !cli.quiet,
    };
    let conversion = convert::convert_coco_file(&cli.coco_annotations, &cli.output, &options)?;

    let mut split_report = None;
    let mut data_yaml_path = None;
    if !cli.no_split {
        let split_options = SplitOptions {
            output_dir: cli.output.clone(),
            show_progress: !cli.quiet,
        };
        split_report = Some(split::split_dataset(
            &cli.images,
            &cli.output,
            &split_options,
        )?);

        let path = data_yaml::write_data_yaml(&cli.output, &conversion.classes)?;
        info!("Wrote {}", path.display());
        data_yaml_path = Some(path);
    }

    match report_format {
        ReportFormat::Json => {
            let run_report = RunReport {
                conversion: &conversion,
                split: split_report.as_ref(),
                data_yaml: data_yaml_path.as_ref(),
            };
            let json = serde_json::to_string_pretty(&run_report)
                .map_err(Coco2YoloError::ReportSerialize)?;
            println!("{}", json);
        }
        ReportFormat::Text => {
            print!("{}", conversion);
            if let Some(report) = &split_report {
                println!();
                print!("{}", report);
            }
        }
    }

    match split_report {
        Some(report) if !report.is_complete() => Err(Coco2YoloError::SplitIncomplete {
            failure_count: report.failure_count(),
            report: Box::new(report),
        }),
        _ => Ok(()),
    }
}
