use crate::backup::{BackupNaming, BackupPlacement, BackupPolicy};
use crate::constants::BACKUP_MARKER;
use crate::processor::{Mode, RunOptions};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "compress-images",
    about = "Reduce file size of PNG and JPEG images",
    long_about = "compress-images walks a file or directory and re-encodes every JPEG and PNG it finds, \
                  keeping the result only when it is smaller. Each compressed file gets a backup-named \
                  sibling, which later runs can restore or delete.",
    version = "0.1.0",
    after_help = "EXAMPLES:\n  \
    compress-images ./photos -q 60\n  \
    compress-images holiday.jpg\n  \
    compress-images ./photos --backup-policy original-aside\n  \
    compress-images ./photos --mode restorebackup\n  \
    compress-images ./photos --mode deletebackup"
)]
pub struct Args {
    #[arg(help = "File or directory name")]
    pub path: PathBuf,

    #[arg(
        long,
        value_enum,
        default_value_t = Mode::Compress,
        help = "Mode to run with",
        long_help = "compress: Compress the image(s). \
                     restorebackup: Restore the backup images (valid for directory path only). \
                     deletebackup: Delete the backup images (valid for directory path only)."
    )]
    pub mode: Mode,

    #[arg(
        short = 'q',
        long,
        help = "Compression quality (1-100, default: 50)",
        long_help = "JPEG compression quality from 1 (lowest) to 100 (highest). \
                     PNG files are always optimised losslessly and ignore this setting."
    )]
    pub quality: Option<u8>,

    #[arg(
        long,
        value_enum,
        default_value_t = BackupPolicy::CompressedAside,
        help = "Which bytes are kept under the backup name",
        long_help = "compressed-aside: write the compressed image to the backup name and leave the \
                     original untouched. \
                     original-aside: move the original to the backup name and write the compressed \
                     image in its place."
    )]
    pub backup_policy: BackupPolicy,

    #[arg(
        long,
        value_enum,
        default_value_t = BackupPlacement::Prefix,
        help = "Where the backup marker goes in the file name",
        long_help = "prefix: compressimages-backup-photo.jpg. \
                     suffix: photo.jpg.compressimages-backup. \
                     Use the same setting for compress, restorebackup and deletebackup runs."
    )]
    pub backup_naming: BackupPlacement,

    #[arg(long, conflicts_with = "verbose", help = "Only print errors and the final count")]
    pub quiet: bool,

    #[arg(short = 'v', long, help = "Also report every file that was processed")]
    pub verbose: bool,
}

impl Args {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            mode: self.mode,
            quality: self.quality,
            naming: BackupNaming::new(BACKUP_MARKER, self.backup_naming),
            policy: self.backup_policy,
        }
    }
}
