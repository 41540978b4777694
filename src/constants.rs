pub const DEFAULT_QUALITY: u8 = 50;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

/// oxipng preset used when PNG optimisation is requested.
pub const PNG_OPTIMIZATION_PRESET: u8 = 4;

/// Extensions picked up by the compress mode, lowercase and without the dot.
pub const COMPRESSIBLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub const BACKUP_MARKER: &str = "compressimages-backup";

// Common output message prefixes
pub const SKIP_PREFIX: &str = "⏭️";
pub const SUCCESS_PREFIX: &str = "✅";
pub const SUMMARY_PREFIX: &str = "📊";
