//! Fuzz target for COCO JSON parsing.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_json_parse

#![no_main]

use coco2yolo::ir::io_coco_json::from_coco_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid OOM on very large inputs.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_coco_slice(data);
});
