#![allow(dead_code)]

use compress_images::{EncodeOptions, ImageCodec, ImageRsCodec};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Luma, Rgb, RgbImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A busy 256x256 pattern saved at quality 100, which re-encodes much smaller.
pub fn compressible_jpeg_bytes() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(256, 256, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    }));
    let mut bytes = Vec::new();
    image
        .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, 100))
        .unwrap();
    bytes
}

/// A 1x1 PNG that has already been through the same encode and optimise pass
/// the tool uses, so there is nothing left to gain.
pub fn minimal_png_bytes() -> Vec<u8> {
    let pixel = DynamicImage::ImageLuma8(image::ImageBuffer::from_pixel(1, 1, Luma([0u8])));
    let mut plain = Vec::new();
    pixel
        .write_to(&mut Cursor::new(&mut plain), ImageFormat::Png)
        .unwrap();

    let codec = ImageRsCodec;
    let decoded = codec.decode(&plain).unwrap();
    codec
        .encode(&decoded, &EncodeOptions::new(None, true).unwrap())
        .unwrap()
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

/// `a.jpg` (compressible), `b.png` (already minimal) and `c.txt` (not an image).
pub fn create_mixed_directory(temp_dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let jpg = write_file(temp_dir, "a.jpg", &compressible_jpeg_bytes());
    let png = write_file(temp_dir, "b.png", &minimal_png_bytes());
    let txt = write_file(temp_dir, "c.txt", b"not an image");
    (jpg, png, txt)
}

pub fn create_nested_directory_structure(temp_dir: &Path) -> PathBuf {
    let subdir = temp_dir.join("subdir").join("deeper");
    fs::create_dir_all(&subdir).unwrap();
    write_file(&subdir, "nested.JPG", &compressible_jpeg_bytes());
    write_file(&subdir, "nested.txt", b"nested text");
    subdir
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}
