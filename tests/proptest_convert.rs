use std::collections::BTreeSet;

use coco2yolo::convert::{convert_document, ConversionMode, ConvertOptions};
use coco2yolo::ir::{AnnotationRecord, CocoDocument, ImageInfo};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// A box fully inside a `w x h` image.
fn arb_bbox(w: f64, h: f64) -> impl Strategy<Value = [f64; 4]> {
    (0.0..w, 0.0..h).prop_flat_map(move |(x, y)| {
        (Just(x), Just(y), 0.0..=(w - x), 0.0..=(h - y)).prop_map(|(x, y, bw, bh)| [x, y, bw, bh])
    })
}

/// Documents whose images are all 640x480, with 0..40 annotations spread
/// over up to 6 images and 1..12 category ids.
fn arb_document() -> impl Strategy<Value = CocoDocument> {
    (1u64..=6).prop_flat_map(|image_count| {
        let annotation = (0..image_count, 1i64..=12, arb_bbox(640.0, 480.0))
            .prop_map(|(image, category, bbox)| AnnotationRecord::with_bbox(image, category, bbox));
        proptest::collection::vec(annotation, 0..40).prop_map(move |annotations| CocoDocument {
            images: (0..image_count)
                .map(|i| ImageInfo::new(i, format!("{i}.jpg"), 640.0, 480.0))
                .collect(),
            annotations,
            ..Default::default()
        })
    })
}

fn parse_line(line: &str) -> (u64, Vec<f64>) {
    let mut parts = line.split(' ');
    let class_id = parts.next().unwrap().parse().unwrap();
    let values = parts.map(|v| v.parse().unwrap()).collect();
    (class_id, values)
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn one_line_per_valid_annotation(document in arb_document()) {
        let (files, report) =
            convert_document(&document, &ConvertOptions::new(ConversionMode::Detection));

        prop_assert_eq!(files.len(), document.images.len());
        prop_assert_eq!(report.skip_count(), 0);
        for file in &files {
            let expected = document
                .annotations
                .iter()
                .filter(|ann| ann.image_id().ok() == Some(file.image_id))
                .count();
            prop_assert_eq!(file.lines.len(), expected);
        }
    }

    #[test]
    fn encounter_order_class_ids_are_dense(document in arb_document()) {
        let (files, report) =
            convert_document(&document, &ConvertOptions::new(ConversionMode::Detection));

        let mut seen = BTreeSet::new();
        let mut next = 0u64;
        for file in &files {
            for line in &file.lines {
                let (class_id, _) = parse_line(line);
                if seen.insert(class_id) {
                    // First sight of a class must be the next unused id.
                    prop_assert_eq!(class_id, next);
                    next += 1;
                }
            }
        }
        prop_assert_eq!(report.classes.len() as u64, next);
    }

    #[test]
    fn detection_values_are_normalized_center_boxes(document in arb_document()) {
        let (files, _) =
            convert_document(&document, &ConvertOptions::new(ConversionMode::Detection));

        for file in &files {
            let image_boxes: Vec<[f64; 4]> = document
                .annotations
                .iter()
                .filter(|ann| ann.image_id().ok() == Some(file.image_id))
                .map(|ann| {
                    let bbox = ann.bbox().unwrap();
                    [bbox.origin.x, bbox.origin.y, bbox.width, bbox.height]
                })
                .collect();

            for (line, [x, y, w, h]) in file.lines.iter().zip(image_boxes) {
                let (_, values) = parse_line(line);
                prop_assert_eq!(values.len(), 4);
                prop_assert!((values[0] - (x + w / 2.0) / 640.0).abs() < 1e-12);
                prop_assert!((values[1] - (y + h / 2.0) / 480.0).abs() < 1e-12);
                prop_assert_eq!(values[2], w / 640.0);
                prop_assert_eq!(values[3], h / 480.0);
                for v in values {
                    prop_assert!((0.0..=1.0 + 1e-12).contains(&v));
                }
            }
        }
    }

    #[test]
    fn conversion_is_deterministic(document in arb_document()) {
        let options = ConvertOptions::new(ConversionMode::Detection);
        let (first, _) = convert_document(&document, &options);
        let (second, _) = convert_document(&document, &options);
        prop_assert_eq!(first, second);
    }
}
