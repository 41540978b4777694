use crate::backup::{BackupNaming, BackupPolicy, DeleteBackup, RestoreBackup};
use crate::codec::{EncodeOptions, ImageRsCodec};
use crate::compress::CompressImage;
use crate::constants::{COMPRESSIBLE_EXTENSIONS, SKIP_PREFIX, SUCCESS_PREFIX};
use crate::error::Result;
use crate::walker::matches_extension;
use crate::{error, info, verbose};
use clap::ValueEnum;
use std::fmt;
use std::path::Path;

/// Which processor a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Compress the image(s)
    #[value(name = "compress")]
    Compress,
    /// Restore the backup images (directories only)
    #[value(name = "restorebackup")]
    RestoreBackup,
    /// Delete the backup images (directories only)
    #[value(name = "deletebackup")]
    DeleteBackup,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Compress => "compress",
            Mode::RestoreBackup => "restorebackup",
            Mode::DeleteBackup => "deletebackup",
        }
    }

    /// Restore and delete only make sense when walking a tree of backups.
    pub fn allows_single_file(&self) -> bool {
        matches!(self, Mode::Compress)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Lowercase, without the leading dot.
    pub extensions: Vec<String>,
    pub naming: BackupNaming,
}

impl ProcessorConfig {
    pub fn new<S: AsRef<str>>(extensions: &[S], naming: BackupNaming) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|ext| ext.as_ref().to_lowercase())
                .collect(),
            naming,
        }
    }

    /// JPEG and PNG files.
    pub fn images(naming: BackupNaming) -> Self {
        Self::new(COMPRESSIBLE_EXTENSIONS, naming)
    }

    /// Backup processors select files through the naming convention, not extensions.
    pub fn backups(naming: BackupNaming) -> Self {
        Self::new::<&str>(&[], naming)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Processed,
    /// Deliberately skipped: read-only, unsupported, no gain.
    Ignored,
    /// Something went wrong while touching the file.
    Failed,
}

/// What happened to one file. Only `Processed` counts as success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub outcome: Outcome,
    pub message: Option<String>,
}

impl FileResult {
    pub fn processed(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Processed,
            message: Some(message.into()),
        }
    }

    pub fn ignored(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Ignored,
            message: Some(message.into()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failed,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Processed
    }

    /// Ignored files go to stdout, failures to stderr, successes only when verbose.
    pub fn report(&self) {
        let Some(message) = &self.message else {
            return;
        };

        match self.outcome {
            Outcome::Processed => {
                verbose!("{} {}", SUCCESS_PREFIX, message);
            }
            Outcome::Ignored => {
                info!("{} {}", SKIP_PREFIX, message);
            }
            Outcome::Failed => {
                error!("{}", message);
            }
        }
    }
}

/// One way of handling a single file.
///
/// `process_file` must never panic and never surface an error: everything that
/// can go wrong for one file is folded into its [`FileResult`].
pub trait FileProcessor {
    fn config(&self) -> &ProcessorConfig;

    fn process_file(&self, path: &Path) -> FileResult;

    /// Whether the tree walker should hand this file name to the processor.
    fn matches(&self, file_name: &str) -> bool {
        matches_extension(file_name, &self.config().extensions)
    }

    /// Process, report, and tell the caller whether it counts as a success.
    fn handle(&self, path: &Path) -> bool {
        let result = self.process_file(path);
        result.report();
        result.is_success()
    }
}

/// Settings that pick and configure a processor at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: Mode,
    pub quality: Option<u8>,
    pub naming: BackupNaming,
    pub policy: BackupPolicy,
}

pub fn build_processor(options: &RunOptions) -> Result<Box<dyn FileProcessor>> {
    let processor: Box<dyn FileProcessor> = match options.mode {
        Mode::Compress => {
            let encode = EncodeOptions::new(options.quality, true)?;
            Box::new(CompressImage::new(
                ImageRsCodec,
                encode,
                options.naming.clone(),
                options.policy,
            ))
        }
        Mode::RestoreBackup => Box::new(RestoreBackup::new(options.naming.clone())),
        Mode::DeleteBackup => Box::new(DeleteBackup::new(options.naming.clone())),
    };

    Ok(processor)
}
