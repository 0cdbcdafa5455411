//! Fuzz target for label-line construction.
//!
//! Any document that parses must convert without panicking in both modes,
//! and every image must get exactly one label file.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_convert

#![no_main]

use coco2yolo::convert::{convert_document, ConversionMode, ConvertOptions};
use coco2yolo::ir::io_coco_json::from_coco_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(document) = from_coco_slice(data) else {
        return;
    };

    for mode in [ConversionMode::Detection, ConversionMode::Segmentation] {
        let (files, report) = convert_document(&document, &ConvertOptions::new(mode));
        assert_eq!(files.len(), document.images.len());
        // Duplicate image ids visit the same annotations more than once.
        assert!(
            report.lines + report.skip_count() + report.orphaned_annotations
                >= document.annotations.len()
        );
    }
});
