use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    InvalidQuality(u8),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Cannot derive a backup path from {0:?}")]
    BackupPath(PathBuf),

    #[error("{0:?} does not carry the backup marker")]
    NotABackup(PathBuf),

    #[error("Could not move {0:?} back after a failed write: {1}")]
    RollbackFailed(PathBuf, std::io::Error),

    #[error("Invalid path {0:?}")]
    InvalidPath(PathBuf),

    #[error("Mode \"{0}\" supported on directories only")]
    DirectoryOnlyMode(String),
}

pub type Result<T> = std::result::Result<T, CompressionError>;
