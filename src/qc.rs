use std::path::Path;

use crate::error::{BrainMappError, Result};

pub fn check_equal_length(
    left_len: usize,
    right_len: usize,
    left_name: &str,
    right_name: &str,
) -> Result<()> {
    if left_len != right_len {
        return Err(BrainMappError::IncompatibleMap(format!(
            "length of {left_name} ({left_len}) and {right_name} ({right_len}) should be equal"
        )));
    }
    Ok(())
}

pub fn check_dir_exists(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(BrainMappError::DirectoryNotFound(path.to_path_buf()));
    }
    Ok(())
}

pub fn check_file_exists(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(BrainMappError::MapFileNotFound(path.to_path_buf()));
    }
    Ok(())
}

pub fn check_cluster_label(value: f64, index: usize, path: &Path) -> Result<u32> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(BrainMappError::format(
            path,
            format!("vertex {index} has invalid cluster label {value}"),
        ));
    }
    Ok(value as u32)
}

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_labels_must_be_whole() {
        let path = Path::new("lh.test.ocn.mgh");
        assert_eq!(check_cluster_label(3.0, 0, path).unwrap(), 3);
        assert!(check_cluster_label(-1.0, 1, path).is_err());
        assert!(check_cluster_label(1.5, 2, path).is_err());
        assert!(check_cluster_label(f64::NAN, 3, path).is_err());
    }

    #[test]
    fn length_mismatch_is_incompatible() {
        let err = check_equal_length(3, 4, "a", "b").unwrap_err();
        assert!(matches!(err, BrainMappError::IncompatibleMap(_)));
    }
}
