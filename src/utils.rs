//! Utility functions for common operations
//!
//! Size reporting helpers shared by the compress processor and the CLI summary,
//! plus the single file-attribute check the tool needs.

use crate::error::Result;
use std::fs;
use std::path::Path;

/// Whether the owner write bit is clear.
///
/// Only the permission bits are consulted, so this is stable regardless of which
/// user runs the tool. Group and other bits are ignored.
#[cfg(unix)]
pub fn is_read_only(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    Ok(fs::metadata(path)?.permissions().mode() & 0o200 == 0)
}

#[cfg(not(unix))]
pub fn is_read_only(path: &Path) -> Result<bool> {
    Ok(fs::metadata(path)?.permissions().readonly())
}

/// Format file size in human-readable format
///
/// # Arguments
/// * `bytes` - Size in bytes
///
/// # Returns
/// * Human-readable size string (e.g., "1.2 MB", "512 B")
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Calculate compression ratio as a percentage
///
/// Positive means the output is smaller than the input.
pub fn calculate_compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    ((original_size as f64 - compressed_size as f64) / original_size as f64) * 100.0
}

/// One-line size report, e.g. `"2.0 KB -> 1.0 KB (50.0% smaller)"`.
pub fn describe_size_change(original_size: u64, compressed_size: u64) -> String {
    format!(
        "{} -> {} ({:.1}% smaller)",
        format_file_size(original_size),
        format_file_size(compressed_size),
        calculate_compression_ratio(original_size, compressed_size)
    )
}
