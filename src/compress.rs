use crate::backup::{BackupNaming, BackupPolicy};
use crate::codec::{EncodeOptions, ImageCodec, ImageRsCodec};
use crate::error;
use crate::error::{CompressionError, Result};
use crate::processor::{FileProcessor, FileResult, ProcessorConfig};
use crate::utils::{describe_size_change, is_read_only};
use crate::walker::matches_extension;
use std::fs;
use std::io;
use std::path::Path;

/// Re-encodes JPEG and PNG files and keeps the result only when it is smaller.
///
/// Where the compressed bytes land is decided by [`BackupPolicy`]:
/// with `CompressedAside` they are written to the backup path and the original is
/// left alone; with `OriginalAside` the original is moved to the backup path and
/// the compressed bytes take its place.
#[derive(Debug, Clone)]
pub struct CompressImage<C = ImageRsCodec> {
    codec: C,
    options: EncodeOptions,
    config: ProcessorConfig,
    policy: BackupPolicy,
}

impl<C: ImageCodec> CompressImage<C> {
    pub fn new(codec: C, options: EncodeOptions, naming: BackupNaming, policy: BackupPolicy) -> Self {
        Self {
            codec,
            options,
            config: ProcessorConfig::images(naming),
            policy,
        }
    }

    /// Decode, re-encode and place the output. Skips come back as `Ok`,
    /// anything that broke comes back as `Err`.
    fn compress(&self, path: &Path, backup_path: &Path) -> Result<FileResult> {
        // The whole file is read up front so no handle is open while encoding.
        let bytes = fs::read(path)?;
        let original_size = bytes.len() as u64;

        let image = match self.codec.decode(&bytes) {
            Ok(image) if image.is_recompressible() => image,
            Ok(image) => {
                return Ok(FileResult::ignored(format!(
                    "Ignoring file {:?} with unsupported format {:?}",
                    path,
                    image.format()
                )));
            }
            Err(e) => {
                return Ok(FileResult::ignored(format!(
                    "Ignoring file {:?} with unsupported format: {}",
                    path, e
                )));
            }
        };
        drop(bytes);

        let options = self.options.with_buffer_hint(image.buffer_hint());
        let encoded = self.codec.encode(&image, &options)?;

        match self.policy {
            BackupPolicy::CompressedAside => self.write_aside(path, backup_path, &encoded),
            BackupPolicy::OriginalAside => {
                self.replace_original(path, backup_path, original_size, &encoded)
            }
        }
    }

    fn write_aside(&self, path: &Path, backup_path: &Path, encoded: &[u8]) -> Result<FileResult> {
        fs::write(backup_path, encoded)?;

        // The written file stays even when it turns out no smaller.
        let original_size = fs::metadata(path)?.len();
        let compressed_size = fs::metadata(backup_path)?.len();
        if compressed_size >= original_size {
            return Ok(cannot_compress(path));
        }

        Ok(FileResult::processed(format!(
            "Compressed {:?} into {:?}: {}",
            path,
            backup_path,
            describe_size_change(original_size, compressed_size)
        )))
    }

    fn replace_original(
        &self,
        path: &Path,
        backup_path: &Path,
        original_size: u64,
        encoded: &[u8],
    ) -> Result<FileResult> {
        let compressed_size = encoded.len() as u64;
        if compressed_size >= original_size {
            return Ok(cannot_compress(path));
        }

        // A second run must not replace the original that is already aside.
        if backup_path.exists() {
            return Ok(FileResult::ignored(format!(
                "Ignoring {:?}, backup {:?} already exists.",
                path, backup_path
            )));
        }

        swap_in(path, backup_path, encoded, |target, bytes| fs::write(target, bytes))?;

        Ok(FileResult::processed(format!(
            "Compressed {:?}, original kept at {:?}: {}",
            path,
            backup_path,
            describe_size_change(original_size, compressed_size)
        )))
    }
}

impl<C: ImageCodec> FileProcessor for CompressImage<C> {
    fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    fn matches(&self, file_name: &str) -> bool {
        !self.config.naming.is_backup_name(file_name)
            && matches_extension(file_name, &self.config.extensions)
    }

    fn process_file(&self, path: &Path) -> FileResult {
        let is_backup = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.config.naming.is_backup_name(name));
        if is_backup {
            return FileResult::ignored(format!("Ignoring backup file {:?}.", path));
        }

        match is_read_only(path) {
            Ok(true) => return FileResult::ignored(format!("Ignoring read-only file {:?}.", path)),
            Ok(false) => {}
            Err(e) => return failure(path, &e),
        }

        let backup_path = match self.config.naming.backup_path_for(path) {
            Ok(backup_path) => backup_path,
            Err(e) => {
                return FileResult::failed(format!(
                    "Skipping file {:?} for which backup cannot be made: {}",
                    path, e
                ));
            }
        };

        self.compress(path, &backup_path)
            .unwrap_or_else(|e| failure(path, &e))
    }
}

fn cannot_compress(path: &Path) -> FileResult {
    FileResult::ignored(format!("Cannot further compress {:?}.", path))
}

fn failure(path: &Path, error: &CompressionError) -> FileResult {
    FileResult::failed(format!("Failure whilst processing {:?}: {}", path, error))
}

/// Move the original to `backup_path` and write `encoded` under its name,
/// putting the original back if the write fails.
fn swap_in<W>(path: &Path, backup_path: &Path, encoded: &[u8], write: W) -> Result<()>
where
    W: FnOnce(&Path, &[u8]) -> io::Result<()>,
{
    fs::rename(path, backup_path)?;
    if let Err(e) = write(path, encoded) {
        roll_back(path, backup_path)?;
        return Err(e.into());
    }
    Ok(())
}

/// Put the original back after the compressed write failed part way.
fn roll_back(path: &Path, backup_path: &Path) -> Result<()> {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            error!("Could not remove partial output {:?}: {}", path, e);
        }
    }
    fs::rename(backup_path, path)
        .map_err(|e| CompressionError::RollbackFailed(backup_path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::BackupPlacement;
    use crate::codec::DecodedImage;
    use crate::constants::BACKUP_MARKER;
    use crate::processor::Outcome;
    use image::codecs::jpeg::JpegEncoder;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Decodes anything to a 1x1 image of a fixed format and encodes to fixed bytes.
    struct FixedCodec {
        format: ImageFormat,
        output: Vec<u8>,
    }

    impl ImageCodec for FixedCodec {
        fn decode(&self, _bytes: &[u8]) -> Result<DecodedImage> {
            Ok(DecodedImage::new(self.format, DynamicImage::new_rgb8(1, 1)))
        }

        fn encode(&self, _image: &DecodedImage, _options: &EncodeOptions) -> Result<Vec<u8>> {
            Ok(self.output.clone())
        }
    }

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
        }))
    }

    fn write_jpeg(path: &Path, quality: u8) -> Vec<u8> {
        let mut bytes = Vec::new();
        gradient(256, 256)
            .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality))
            .unwrap();
        fs::write(path, &bytes).unwrap();
        bytes
    }

    fn compressor(policy: BackupPolicy) -> CompressImage {
        CompressImage::new(
            ImageRsCodec,
            EncodeOptions::new(Some(50), true).unwrap(),
            BackupNaming::default(),
            policy,
        )
    }

    fn backup_of(path: &Path) -> PathBuf {
        BackupNaming::default().backup_path_for(path).unwrap()
    }

    #[test]
    fn test_compress_jpeg_writes_smaller_backup() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        let original = write_jpeg(&path, 100);

        let result = compressor(BackupPolicy::CompressedAside).process_file(&path);

        assert!(result.is_success(), "{:?}", result);
        let backup = backup_of(&path);
        assert!(fs::metadata(&backup).unwrap().len() < original.len() as u64);
        assert_eq!(fs::read(&path).unwrap(), original);
    }

    #[test]
    fn test_compress_read_only_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        write_jpeg(&path, 100);
        let mut permissions = fs::metadata(&path).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&path, permissions).unwrap();

        let result = compressor(BackupPolicy::CompressedAside).process_file(&path);

        assert_eq!(result.outcome, Outcome::Ignored);
        assert!(result.message.unwrap().contains("read-only"));
        assert!(!backup_of(&path).exists());
    }

    #[test]
    fn test_compress_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.jpg");

        let result = compressor(BackupPolicy::CompressedAside).process_file(&path);
        assert_eq!(result.outcome, Outcome::Failed);
    }

    #[test]
    fn test_compress_unsupported_format() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("actually_webp.png");
        let mut bytes = Vec::new();
        gradient(8, 8)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::WebP)
            .unwrap();
        fs::write(&path, &bytes).unwrap();

        let result = compressor(BackupPolicy::CompressedAside).process_file(&path);

        assert_eq!(result.outcome, Outcome::Ignored);
        assert!(result.message.unwrap().contains("unsupported format"));
        assert!(!backup_of(&path).exists());
    }

    #[test]
    fn test_compress_undecodable_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.jpg");
        fs::write(&path, b"fake image data").unwrap();

        let result = compressor(BackupPolicy::CompressedAside).process_file(&path);

        assert_eq!(result.outcome, Outcome::Ignored);
        assert!(!backup_of(&path).exists());
    }

    #[test]
    fn test_compress_no_gain_leaves_backup_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tiny.png");
        fs::write(&path, b"0123456789").unwrap();

        let processor = CompressImage::new(
            FixedCodec {
                format: ImageFormat::Png,
                output: b"0123456789".to_vec(),
            },
            EncodeOptions::new(None, true).unwrap(),
            BackupNaming::default(),
            BackupPolicy::CompressedAside,
        );
        let result = processor.process_file(&path);

        assert_eq!(result.outcome, Outcome::Ignored);
        assert!(result.message.unwrap().starts_with("Cannot further compress"));
        assert!(backup_of(&path).exists());
        assert_eq!(fs::read(&path).unwrap(), b"0123456789");
    }

    #[test]
    fn test_original_aside_no_gain_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tiny.png");
        fs::write(&path, b"0123456789").unwrap();

        let processor = CompressImage::new(
            FixedCodec {
                format: ImageFormat::Png,
                output: b"0123456789abc".to_vec(),
            },
            EncodeOptions::new(None, true).unwrap(),
            BackupNaming::default(),
            BackupPolicy::OriginalAside,
        );

        assert!(!processor.handle(&path));
        assert!(!backup_of(&path).exists());
        assert_eq!(fs::read(&path).unwrap(), b"0123456789");
    }

    #[test]
    fn test_original_aside_swaps_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.JPG");
        let original = write_jpeg(&path, 100);

        let result = compressor(BackupPolicy::OriginalAside).process_file(&path);

        assert!(result.is_success(), "{:?}", result);
        assert_eq!(fs::read(backup_of(&path)).unwrap(), original);
        let compressed = fs::read(&path).unwrap();
        assert!(compressed.len() < original.len());
        assert_eq!(
            ImageRsCodec.decode(&compressed).unwrap().format(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_compress_with_suffix_naming() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpeg");
        write_jpeg(&path, 100);

        let processor = CompressImage::new(
            ImageRsCodec,
            EncodeOptions::new(Some(40), true).unwrap(),
            BackupNaming::new(BACKUP_MARKER, BackupPlacement::Suffix),
            BackupPolicy::CompressedAside,
        );

        assert!(processor.handle(&path));
        assert!(temp_dir
            .path()
            .join("photo.jpeg.compressimages-backup")
            .exists());
    }

    #[test]
    fn test_roll_back_restores_original() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        let backup = backup_of(&path);
        fs::write(&backup, b"original").unwrap();
        fs::write(&path, b"partial").unwrap();

        roll_back(&path, &backup).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"original");
        assert!(!backup.exists());
    }

    #[test]
    fn test_roll_back_without_backup() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        let backup = backup_of(&path);

        let result = roll_back(&path, &backup);
        assert!(matches!(result, Err(CompressionError::RollbackFailed(_, _))));
    }

    #[test]
    fn test_compressor_matches_images_but_not_backups() {
        let processor = compressor(BackupPolicy::OriginalAside);
        assert!(processor.matches("photo.Jpeg"));
        assert!(!processor.matches("photo.gif"));
        assert!(!processor.matches("compressimages-backup-photo.jpg"));
        assert!(!processor.matches("COMPRESSIMAGES-BACKUP-photo.png"));
    }

    /// Always shrinks the input to a fixed short output.
    fn shrinking(policy: BackupPolicy) -> CompressImage<FixedCodec> {
        CompressImage::new(
            FixedCodec {
                format: ImageFormat::Jpeg,
                output: b"small".to_vec(),
            },
            EncodeOptions::new(None, true).unwrap(),
            BackupNaming::default(),
            policy,
        )
    }

    #[test]
    fn test_original_aside_second_run_keeps_original_backup() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.jpg");
        fs::write(&path, b"ORIGINAL-BYTES-0123456789").unwrap();
        let processor = shrinking(BackupPolicy::OriginalAside);

        assert!(processor.handle(&path));
        assert_eq!(fs::read(backup_of(&path)).unwrap(), b"ORIGINAL-BYTES-0123456789");

        // The compressed file is now large enough again to look shrinkable.
        fs::write(&path, b"compressed-but-padded-out").unwrap();
        let result = processor.process_file(&path);

        assert_eq!(result.outcome, Outcome::Ignored);
        assert!(result.message.unwrap().contains("already exists"));
        assert_eq!(fs::read(backup_of(&path)).unwrap(), b"ORIGINAL-BYTES-0123456789");
        assert_eq!(fs::read(&path).unwrap(), b"compressed-but-padded-out");
    }

    #[test]
    fn test_compress_ignores_backup_files() {
        let temp_dir = TempDir::new().unwrap();
        let backup = temp_dir.path().join("compressimages-backup-a.jpg");
        fs::write(&backup, b"ORIGINAL-BYTES-0123456789").unwrap();

        for policy in [BackupPolicy::CompressedAside, BackupPolicy::OriginalAside] {
            let result = shrinking(policy).process_file(&backup);
            assert_eq!(result.outcome, Outcome::Ignored);
        }
        assert_eq!(fs::read(&backup).unwrap(), b"ORIGINAL-BYTES-0123456789");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_swap_in_rolls_back_failed_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        let backup = backup_of(&path);
        fs::write(&path, b"original").unwrap();

        let result = swap_in(&path, &backup, b"compressed", |target, _| {
            fs::write(target, b"half")?;
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        });

        assert!(matches!(result, Err(CompressionError::Io(_))));
        assert_eq!(fs::read(&path).unwrap(), b"original");
        assert!(!backup.exists());
    }

    #[test]
    fn test_swap_in_rolls_back_when_nothing_was_written() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        let backup = backup_of(&path);
        fs::write(&path, b"original").unwrap();

        let result = swap_in(&path, &backup, b"compressed", |_, _| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap(), b"original");
        assert!(!backup.exists());
    }

    #[test]
    fn test_swap_in_writes_compressed_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("photo.jpg");
        let backup = backup_of(&path);
        fs::write(&path, b"original").unwrap();

        swap_in(&path, &backup, b"compressed", |target, bytes| fs::write(target, bytes)).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"compressed");
        assert_eq!(fs::read(&backup).unwrap(), b"original");
    }
}
