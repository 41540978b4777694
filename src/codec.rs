//! Image codec seam
//!
//! Processors never touch the `image` or `oxipng` crates directly; they go through
//! [`ImageCodec`], which keeps decode and encode swappable in tests.

use crate::constants::{DEFAULT_QUALITY, MAX_QUALITY, MIN_QUALITY, PNG_OPTIMIZATION_PRESET};
use crate::error::{CompressionError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat, ImageReader};
use oxipng::Options;
use std::borrow::Cow;
use std::io::Cursor;

/// A decoded image together with the container format it was read from.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    format: ImageFormat,
    image: DynamicImage,
}

impl DecodedImage {
    pub fn new(format: ImageFormat, image: DynamicImage) -> Self {
        Self { format, image }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Whether the compress mode knows how to re-encode this image.
    pub fn is_recompressible(&self) -> bool {
        matches!(self.format, ImageFormat::Jpeg | ImageFormat::Png)
    }

    /// Output buffer size worth reserving before encoding: one byte per pixel.
    pub fn buffer_hint(&self) -> usize {
        let (width, height) = self.image.dimensions();
        (width as usize).saturating_mul(height as usize)
    }
}

/// Per-call encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// JPEG quality, 1-100. PNG output ignores it.
    pub quality: u8,
    /// Run the lossless PNG optimiser over the encoded bytes.
    pub optimize: bool,
    /// Bytes to reserve for the output buffer up front.
    pub buffer_hint: usize,
}

impl EncodeOptions {
    pub fn new(quality: Option<u8>, optimize: bool) -> Result<Self> {
        let quality = quality.unwrap_or(DEFAULT_QUALITY);
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(CompressionError::InvalidQuality(quality));
        }

        Ok(Self {
            quality,
            optimize,
            buffer_hint: 0,
        })
    }

    pub fn with_buffer_hint(mut self, buffer_hint: usize) -> Self {
        self.buffer_hint = buffer_hint;
        self
    }
}

pub trait ImageCodec {
    /// Sniff the format from the bytes themselves and decode.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage>;

    /// Encode back into the image's own format.
    fn encode(&self, image: &DecodedImage, options: &EncodeOptions) -> Result<Vec<u8>>;
}

/// Codec backed by the `image` crate, with `oxipng` for PNG optimisation.
///
/// JPEG output honours `quality`; the JPEG encoder has no Huffman-table
/// optimisation pass, so `optimize` only affects PNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageRsCodec;

impl ImageCodec for ImageRsCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let format = reader.format().ok_or_else(|| {
            CompressionError::UnsupportedFormat("unrecognised image data".to_string())
        })?;
        let image = reader.decode()?;

        Ok(DecodedImage::new(format, image))
    }

    fn encode(&self, image: &DecodedImage, options: &EncodeOptions) -> Result<Vec<u8>> {
        let mut buffer = Vec::with_capacity(options.buffer_hint);

        match image.format() {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut buffer, options.quality);
                jpeg_compatible(image.image()).write_with_encoder(encoder)?;
            }
            ImageFormat::Png => {
                image
                    .image()
                    .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
                if options.optimize {
                    buffer = optimize_png(&buffer)?;
                }
            }
            other => {
                return Err(CompressionError::UnsupportedFormat(format!("{:?}", other)));
            }
        }

        Ok(buffer)
    }
}

/// The JPEG encoder only takes 8-bit luma or RGB without alpha.
fn jpeg_compatible(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image.color() {
        ColorType::L8 | ColorType::Rgb8 => Cow::Borrowed(image),
        color if !color.has_color() => Cow::Owned(DynamicImage::ImageLuma8(image.to_luma8())),
        _ => Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8())),
    }
}

fn optimize_png(data: &[u8]) -> Result<Vec<u8>> {
    let options = Options::from_preset(PNG_OPTIMIZATION_PRESET);
    oxipng::optimize_from_memory(data, &options)
        .map_err(|e| CompressionError::PngOptimization(e.to_string()))
}
