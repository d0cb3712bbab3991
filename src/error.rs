use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrainMappError {
    #[error("directory not found or unreadable: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("map file not found: {}", .0.display())]
    MapFileNotFound(PathBuf),

    #[error("malformed map file {}: {reason}", path.display())]
    MapFormat { path: PathBuf, reason: String },

    #[error("incompatible maps: {0}")]
    IncompatibleMap(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BrainMappError {
    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MapFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BrainMappError>;
