// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding
//!
//! Turns a [`CapturedFrame`] into a downloadable file:
//! - PNG (lossless, default)
//! - JPEG (with quality control)

use super::processing::CapturedFrame;
use crate::constants::export::{FILENAME_PREFIX, JPEG_QUALITY};
use crate::errors::ExportError;
use chrono::{DateTime, Local};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingFormat {
    /// PNG format (lossless compression)
    #[default]
    Png,
    /// JPEG format (lossy compression)
    Jpeg,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Png => "png",
            EncodingFormat::Jpeg => "jpg",
        }
    }

    /// Format matching a file extension, case-insensitive
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(EncodingFormat::Png),
            "jpg" | "jpeg" => Some(EncodingFormat::Jpeg),
            _ => None,
        }
    }
}

/// Encoded image data ready for saving
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: EncodingFormat,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Local>,
}

impl EncodedImage {
    /// Download filename, e.g. `photobooth-1718000000123.png`
    pub fn filename(&self) -> String {
        format!(
            "{}-{}.{}",
            FILENAME_PREFIX,
            self.captured_at.timestamp_millis(),
            self.format.extension()
        )
    }
}

/// Photo encoder
#[derive(Debug, Clone)]
pub struct PhotoEncoder {
    format: EncodingFormat,
    jpeg_quality: u8,
}

impl PhotoEncoder {
    /// Create a new encoder producing PNG
    pub fn new() -> Self {
        Self {
            format: EncodingFormat::Png,
            jpeg_quality: JPEG_QUALITY,
        }
    }

    pub fn with_format(mut self, format: EncodingFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> EncodingFormat {
        self.format
    }

    /// Encode the baked pixels of a captured frame
    ///
    /// CPU-bound; async callers should run it on the blocking pool.
    pub fn encode(&self, frame: &CapturedFrame) -> Result<EncodedImage, ExportError> {
        let (width, height) = frame.dimensions();
        let data = match self.format {
            EncodingFormat::Png => Self::encode_png(frame)?,
            EncodingFormat::Jpeg => Self::encode_jpeg(frame, self.jpeg_quality)?,
        };

        debug!(size = data.len(), format = ?self.format, "Encoding complete");

        Ok(EncodedImage {
            data,
            format: self.format,
            width,
            height,
            captured_at: frame.captured_at(),
        })
    }

    /// Encode image as JPEG
    fn encode_jpeg(frame: &CapturedFrame, quality: u8) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgba8(frame.image().clone()).to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
        rgb.write_with_encoder(encoder)?;

        Ok(buffer)
    }

    /// Encode image as PNG
    fn encode_png(frame: &CapturedFrame) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Vec::new();
        frame
            .image()
            .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)?;
        Ok(buffer)
    }
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterId;
    use chrono::TimeZone;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_format_from_extension() {
        assert_eq!(EncodingFormat::from_extension("png"), Some(EncodingFormat::Png));
        assert_eq!(EncodingFormat::from_extension("JPG"), Some(EncodingFormat::Jpeg));
        assert_eq!(EncodingFormat::from_extension("jpeg"), Some(EncodingFormat::Jpeg));
        assert_eq!(EncodingFormat::from_extension("webp"), None);
    }

    fn captured() -> CapturedFrame {
        let at = Local.timestamp_millis_opt(1_718_000_000_123).unwrap();
        CapturedFrame::new(
            RgbaImage::from_pixel(6, 4, Rgba([10, 20, 30, 255])),
            FilterId::Neon,
            at,
        )
    }

    #[test]
    fn test_png_decodes_to_baked_pixels() {
        let frame = captured();
        let encoded = PhotoEncoder::new().encode(&frame).unwrap();
        assert_eq!(encoded.format, EncodingFormat::Png);

        let decoded = image::load_from_memory_with_format(&encoded.data, ImageFormat::Png)
            .unwrap()
            .to_rgba8();
        assert_eq!(&decoded, frame.image());
    }

    #[test]
    fn test_jpeg_encoding() {
        let encoded = PhotoEncoder::new()
            .with_format(EncodingFormat::Jpeg)
            .encode(&captured())
            .unwrap();
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);
        assert_eq!((encoded.width, encoded.height), (6, 4));
    }

    #[test]
    fn test_filename_uses_capture_time() {
        let encoded = PhotoEncoder::new().encode(&captured()).unwrap();
        assert_eq!(encoded.filename(), "photobooth-1718000000123.png");

        let jpeg = PhotoEncoder::new()
            .with_format(EncodingFormat::Jpeg)
            .encode(&captured())
            .unwrap();
        assert!(jpeg.filename().ends_with(".jpg"));
    }
}
