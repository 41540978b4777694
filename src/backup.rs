//! Backup naming, the compress-side backup policy, and the two processors that
//! clean up after a compress run.

use crate::constants::BACKUP_MARKER;
use crate::error::{CompressionError, Result};
use crate::processor::{FileProcessor, FileResult, ProcessorConfig};
use clap::ValueEnum;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the marker goes relative to the original file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackupPlacement {
    /// `photo.jpg` -> `compressimages-backup-photo.jpg`
    #[default]
    Prefix,
    /// `photo.jpg` -> `photo.jpg.compressimages-backup`
    Suffix,
}

/// Maps original file names to backup names and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupNaming {
    marker: String,
    placement: BackupPlacement,
}

impl Default for BackupNaming {
    fn default() -> Self {
        Self::new(BACKUP_MARKER, BackupPlacement::default())
    }
}

impl BackupNaming {
    pub fn new(marker: impl Into<String>, placement: BackupPlacement) -> Self {
        Self {
            marker: marker.into(),
            placement,
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn placement(&self) -> BackupPlacement {
        self.placement
    }

    pub fn backup_name(&self, file_name: &str) -> String {
        match self.placement {
            BackupPlacement::Prefix => format!("{}-{}", self.marker, file_name),
            BackupPlacement::Suffix => format!("{}.{}", file_name, self.marker),
        }
    }

    /// Sibling path the backup of `original` lives at.
    pub fn backup_path_for(&self, original: &Path) -> Result<PathBuf> {
        let file_name = original
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| CompressionError::BackupPath(original.to_path_buf()))?;
        let parent = original
            .parent()
            .ok_or_else(|| CompressionError::BackupPath(original.to_path_buf()))?;

        Ok(parent.join(self.backup_name(file_name)))
    }

    /// The original file name, if `file_name` carries the marker (ASCII case-insensitive)
    /// and something is left once it is removed.
    pub fn strip_marker<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let stripped = match self.placement {
            BackupPlacement::Prefix => {
                let token = format!("{}-", self.marker);
                let head = file_name.get(..token.len())?;
                if !head.eq_ignore_ascii_case(&token) {
                    return None;
                }
                &file_name[token.len()..]
            }
            BackupPlacement::Suffix => {
                let token = format!(".{}", self.marker);
                let split = file_name.len().checked_sub(token.len())?;
                let tail = file_name.get(split..)?;
                if !tail.eq_ignore_ascii_case(&token) {
                    return None;
                }
                &file_name[..split]
            }
        };

        (!stripped.is_empty()).then_some(stripped)
    }

    pub fn is_backup_name(&self, file_name: &str) -> bool {
        self.strip_marker(file_name).is_some()
    }

    pub fn original_path_for(&self, backup: &Path) -> Option<PathBuf> {
        let file_name = backup.file_name()?.to_str()?;
        let original = self.strip_marker(file_name)?;
        Some(backup.with_file_name(original))
    }
}

/// Which bytes end up under the backup name when a file is compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackupPolicy {
    /// Compressed output goes to the backup path; the original is never touched.
    #[default]
    CompressedAside,
    /// The original moves to the backup path and the compressed output takes its name.
    OriginalAside,
}

/// Moves each backup back over the file it was derived from.
#[derive(Debug, Clone)]
pub struct RestoreBackup {
    config: ProcessorConfig,
}

impl RestoreBackup {
    pub fn new(naming: BackupNaming) -> Self {
        Self {
            config: ProcessorConfig::backups(naming),
        }
    }

    fn restore(&self, backup: &Path) -> Result<PathBuf> {
        let target = self
            .config
            .naming
            .original_path_for(backup)
            .ok_or_else(|| CompressionError::NotABackup(backup.to_path_buf()))?;
        fs::rename(backup, &target)?;
        Ok(target)
    }
}

impl FileProcessor for RestoreBackup {
    fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    fn matches(&self, file_name: &str) -> bool {
        self.config.naming.is_backup_name(file_name)
    }

    fn process_file(&self, path: &Path) -> FileResult {
        match self.restore(path) {
            Ok(target) => FileResult::processed(format!("Restored {:?} to {:?}", path, target)),
            Err(e) => FileResult::failed(format!(
                "Failed to restore backup file {:?}: {}",
                path, e
            )),
        }
    }
}

/// Removes backups, keeping whatever sits under the original name.
#[derive(Debug, Clone)]
pub struct DeleteBackup {
    config: ProcessorConfig,
}

impl DeleteBackup {
    pub fn new(naming: BackupNaming) -> Self {
        Self {
            config: ProcessorConfig::backups(naming),
        }
    }
}

impl FileProcessor for DeleteBackup {
    fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    fn matches(&self, file_name: &str) -> bool {
        self.config.naming.is_backup_name(file_name)
    }

    fn process_file(&self, path: &Path) -> FileResult {
        match fs::remove_file(path) {
            Ok(()) => FileResult::processed(format!("Deleted {:?}", path)),
            Err(e) => FileResult::failed(format!("Failed to delete backup file {:?}: {}", path, e)),
        }
    }
}
