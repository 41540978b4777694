use crate::error;
use crate::processor::FileProcessor;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Case-insensitive `.ext` suffix check against lowercase extensions.
///
/// This is a plain suffix match, not an extension parser: `photo.JPG` matches
/// `jpg`, while `photo.jpgold` and `photojpg` do not.
pub fn matches_extension(file_name: &str, extensions: &[String]) -> bool {
    let lowercase_name = file_name.to_lowercase();
    extensions.iter().any(|ext| {
        lowercase_name
            .strip_suffix(ext.as_str())
            .is_some_and(|rest| rest.ends_with('.'))
    })
}

/// Every file under `root` the processor wants, gathered before anything is touched.
///
/// Symlinked directories are not descended into; entries that cannot be read
/// are reported and skipped.
pub fn collect_matching_files<P>(root: &Path, processor: &P) -> Vec<PathBuf>
where
    P: FileProcessor + ?Sized,
{
    let mut files = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!("Skipping unreadable entry under {:?}: {}", root, e);
                continue;
            }
        };

        let path = entry.path();
        if path.is_file() && processor.matches(&entry.file_name().to_string_lossy()) {
            files.push(path.to_path_buf());
        }
    }

    files
}

/// Recursively runs `processor` over every matching file under `root`.
///
/// Returns how many files the processor reported as successfully handled.
/// The file list is taken up front, so backups written during the run are
/// never picked up by the same run.
pub fn process_directory<P>(root: &Path, processor: &P) -> usize
where
    P: FileProcessor + ?Sized,
{
    collect_matching_files(root, processor)
        .iter()
        .filter(|path| processor.handle(path))
        .count()
}
