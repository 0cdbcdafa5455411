//! Criterion microbenches for COCO parsing and label-line construction.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use coco2yolo::convert::{convert_document, ConversionMode, ConvertOptions};
use coco2yolo::ir::io_coco_json::{from_coco_slice, from_coco_str};
use coco2yolo::ir::{AnnotationRecord, CocoDocument, ImageInfo};

// Include test fixtures at compile time (no file I/O during benchmark)
const COCO_FIXTURE: &str = include_str!("../tests/fixtures/sample.coco.json");

/// A larger synthetic document: 500 images with 20 boxes and polygons each.
fn synthetic_document() -> CocoDocument {
    let images = (0..500u64)
        .map(|i| ImageInfo::new(i, format!("{i:06}.jpg"), 640.0, 480.0))
        .collect();
    let annotations = (0..500u64)
        .flat_map(|image| {
            (0..20u64).map(move |k| {
                let x = (k * 13) as f64;
                let y = (k * 7) as f64;
                let category = (k % 80 + 1) as i64;
                let mut record = AnnotationRecord::with_bbox(image, category, [x, y, 40.0, 30.0]);
                record.segmentation = AnnotationRecord::with_polygon(
                    image,
                    category,
                    &[x, y, x + 40.0, y, x + 40.0, y + 30.0, x, y + 30.0],
                )
                .segmentation;
                record
            })
        })
        .collect();

    CocoDocument {
        images,
        annotations,
        ..Default::default()
    }
}

fn bench_coco_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("coco_parse");
    group.throughput(Throughput::Bytes(COCO_FIXTURE.len() as u64));

    group.bench_function("from_coco_str", |b| {
        b.iter(|| {
            let doc = from_coco_str(black_box(COCO_FIXTURE)).unwrap();
            black_box(doc)
        })
    });

    group.bench_function("from_coco_slice", |b| {
        b.iter(|| {
            let doc = from_coco_slice(black_box(COCO_FIXTURE.as_bytes())).unwrap();
            black_box(doc)
        })
    });

    group.finish();
}

/// Benchmark label-line construction in both modes.
///
/// No files are written; this measures grouping, remapping and formatting.
fn bench_convert(c: &mut Criterion) {
    let document = synthetic_document();

    let mut group = c.benchmark_group("convert_document");
    group.throughput(Throughput::Elements(document.annotations.len() as u64));

    for mode in [ConversionMode::Detection, ConversionMode::Segmentation] {
        let options = ConvertOptions::new(mode);
        group.bench_function(mode.name(), |b| {
            b.iter(|| {
                let converted = convert_document(black_box(&document), &options);
                black_box(converted)
            })
        });
    }

    let mut fixed = ConvertOptions::new(ConversionMode::Detection);
    fixed.precision = Some(6);
    group.bench_function("detection_precision_6", |b| {
        b.iter(|| {
            let converted = convert_document(black_box(&document), &fixed);
            black_box(converted)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_coco_parse, bench_convert);
criterion_main!(benches);
