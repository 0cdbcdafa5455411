//! Ultralytics `data.yaml` for the split tree.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::convert::ClassEntry;
use crate::error::Coco2YoloError;
use crate::split::Split;

pub const DATA_YAML_FILE: &str = "data.yaml";

#[derive(Debug, Serialize)]
struct DataYaml {
    path: String,
    train: String,
    val: String,
    test: String,
    nc: u64,
    names: BTreeMap<u64, String>,
}

impl DataYaml {
    fn new(output_dir: &Path, classes: &[ClassEntry]) -> Self {
        let images_of = |split: Split| format!("{}/images", split.dir_name());
        let declared: BTreeMap<u64, String> = classes
            .iter()
            .map(|class| (class.class_id.as_u64(), class.display_name()))
            .collect();

        // Ids can be sparse under the category policy; `nc` must cover the
        // largest id and every id below it needs a name.
        let nc = declared.keys().next_back().map_or(0, |max| max + 1);
        let names: BTreeMap<u64, String> = (0..nc)
            .map(|id| {
                let name = declared
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| format!("class_{}", id));
                (id, name)
            })
            .collect();

        // Ultralytics resolves relative split paths against `path`.
        let root = fs::canonicalize(output_dir).unwrap_or_else(|_| output_dir.to_path_buf());

        Self {
            path: root.display().to_string(),
            train: images_of(Split::Train),
            val: images_of(Split::Valid),
            test: images_of(Split::Test),
            nc,
            names,
        }
    }
}

/// Write `<output_dir>/data.yaml` describing the split tree and class names.
///
/// Returns the path written.
pub fn write_data_yaml(output_dir: &Path, classes: &[ClassEntry]) -> Result<PathBuf, Coco2YoloError> {
    let yaml = serde_yaml::to_string(&DataYaml::new(output_dir, classes))
        .map_err(Coco2YoloError::DataYamlSerialize)?;

    let path = output_dir.join(DATA_YAML_FILE);
    fs::write(&path, yaml).map_err(|source| Coco2YoloError::DataYamlWrite {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
