pub mod logger;

pub mod backup;
pub mod cli;
pub mod codec;
pub mod compress;
pub mod constants;
pub mod error;
pub mod processor;
pub mod utils;
pub mod walker;

use std::path::Path;

pub use backup::{BackupNaming, BackupPlacement, BackupPolicy, DeleteBackup, RestoreBackup};
pub use codec::{DecodedImage, EncodeOptions, ImageCodec, ImageRsCodec};
pub use compress::CompressImage;
pub use error::{CompressionError, Result};
pub use processor::{
    build_processor, FileProcessor, FileResult, Mode, Outcome, ProcessorConfig, RunOptions,
};
pub use walker::{collect_matching_files, matches_extension, process_directory};

/// What a run did with the path it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSummary {
    /// A single file was handed to the processor; the result is not an error either way.
    SingleFile { success: bool },
    /// A directory was walked and this many files were updated.
    Directory { file_count: usize },
}

/// Pick the processor for `options` and run it over `path`.
///
/// Only usage problems come back as errors: an invalid quality, a path that is
/// neither file nor directory, or a directory-only mode given a single file.
pub fn run(path: &Path, options: &RunOptions) -> Result<RunSummary> {
    let processor = build_processor(options)?;

    if path.is_file() {
        if !options.mode.allows_single_file() {
            return Err(CompressionError::DirectoryOnlyMode(options.mode.to_string()));
        }
        let success = processor.handle(path);
        Ok(RunSummary::SingleFile { success })
    } else if path.is_dir() {
        let file_count = process_directory(path, processor.as_ref());
        Ok(RunSummary::Directory { file_count })
    } else {
        Err(CompressionError::InvalidPath(path.to_path_buf()))
    }
}
