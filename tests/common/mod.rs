#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const SAMPLE_COCO: &str = "tests/fixtures/sample.coco.json";

/// Image file names referenced by the sample fixture, in sorted order.
pub const SAMPLE_IMAGES: [&str; 3] = ["000001.jpg", "000002.png", "000003.jpg"];

/// Write a placeholder file. Contents are never decoded.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, b"not really an image").expect("write file");
}

/// Create an image directory holding the sample fixture's images.
pub fn sample_image_dir(root: &Path) -> PathBuf {
    let dir = root.join("images");
    for name in SAMPLE_IMAGES {
        touch(&dir.join(name));
    }
    dir
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
}
