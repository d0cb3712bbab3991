use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{BrainMappError, Result};
use crate::qc::{check_dir_exists, is_hidden};

pub type ModelIndex = BTreeMap<String, Vec<String>>;

// Models are not validated here; a model without result files only fails once it is extracted.
pub fn detect_models(results_dir: &Path) -> Result<ModelIndex> {
    check_dir_exists(results_dir)?;

    let mut index = ModelIndex::new();
    for group in list_subdirs(results_dir)? {
        let models = list_subdirs(&results_dir.join(&group))?;
        debug!("Group {group}: {} models", models.len());
        index.insert(group, models);
    }

    info!(
        "Found {} groups in {}",
        index.len(),
        results_dir.display()
    );
    Ok(index)
}

fn list_subdirs(dir: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(dir).map_err(|_| BrainMappError::DirectoryNotFound(dir.to_path_buf()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden(&name) || !entry.path().is_dir() {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}
