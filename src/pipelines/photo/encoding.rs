// SPDX-License-Identifier: GPL-3.0-only

//! Async photo encoding and persistence
//!
//! This module handles encoding finished captures to:
//! - JPEG (with quality control)
//! - PNG (lossless)
//!
//! Encoding and disk I/O run on blocking tasks so the runtime stays free.

use crate::constants::{EncodingQuality, FILE_PREFIX, PhotoOutputFormat};
use crate::errors::{AppError, AppResult};
use crate::storage;
use image::{DynamicImage, RgbaImage};
use std::path::PathBuf;
use tracing::{debug, info};

/// Encoded image data ready for saving
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: PhotoOutputFormat,
    pub width: u32,
    pub height: u32,
}

/// Photo encoder
#[derive(Debug, Clone)]
pub struct PhotoEncoder {
    format: PhotoOutputFormat,
    quality: EncodingQuality,
}

impl PhotoEncoder {
    /// Create a new encoder with JPEG format and high quality
    pub fn new() -> Self {
        Self {
            format: PhotoOutputFormat::Jpeg,
            quality: EncodingQuality::High,
        }
    }

    /// Set encoding format
    pub fn set_format(&mut self, format: PhotoOutputFormat) {
        self.format = format;
    }

    /// Set encoding quality (only affects JPEG)
    pub fn set_quality(&mut self, quality: EncodingQuality) {
        self.quality = quality;
    }

    /// Encode an image on a blocking task
    pub async fn encode(&self, image: RgbaImage) -> AppResult<EncodedImage> {
        info!(
            width = image.width(),
            height = image.height(),
            format = ?self.format,
            "Starting encoding"
        );

        let format = self.format;
        let quality = self.quality;

        tokio::task::spawn_blocking(move || {
            let (width, height) = image.dimensions();
            let data = match format {
                PhotoOutputFormat::Jpeg => Self::encode_jpeg(image, quality)?,
                PhotoOutputFormat::Png => Self::encode_png(image)?,
            };

            debug!(size = data.len(), "Encoding complete");

            Ok(EncodedImage {
                data,
                format,
                width,
                height,
            })
        })
        .await
        .map_err(|e| AppError::Other(format!("Encoding task error: {}", e)))?
    }

    /// Write an encoded image to `output_dir` under a timestamped name
    pub async fn save(&self, encoded: EncodedImage, output_dir: PathBuf) -> AppResult<PathBuf> {
        let filepath = tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&output_dir)?;
            let path =
                storage::unique_output_path(&output_dir, FILE_PREFIX, encoded.format.extension());
            std::fs::write(&path, &encoded.data)?;
            Ok::<_, AppError>(path)
        })
        .await
        .map_err(|e| AppError::Other(format!("Save task error: {}", e)))??;

        info!(path = %filepath.display(), "Photo saved successfully");
        Ok(filepath)
    }

    /// Encode then save in one step
    pub async fn encode_and_save(&self, image: RgbaImage, output_dir: PathBuf) -> AppResult<PathBuf> {
        let encoded = self.encode(image).await?;
        self.save(encoded, output_dir).await
    }

    /// Encode image as JPEG (alpha is dropped)
    fn encode_jpeg(image: RgbaImage, quality: EncodingQuality) -> AppResult<Vec<u8>> {
        let rgb = DynamicImage::ImageRgba8(image).into_rgb8();
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality.jpeg_quality());
        encoder.encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )?;

        Ok(buffer)
    }

    /// Encode image as PNG
    fn encode_png(image: RgbaImage) -> AppResult<Vec<u8>> {
        let mut buffer = Vec::new();
        image.write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Png,
        )?;
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
    use image::Rgba;

    #[tokio::test]
    async fn test_png_encoding_is_lossless() {
        let image = RgbaImage::from_pixel(4, 3, Rgba([12, 34, 56, 255]));
        let mut encoder = PhotoEncoder::new();
        encoder.set_format(PhotoOutputFormat::Png);

        let encoded = encoder.encode(image.clone()).await.unwrap();
        assert_eq!((encoded.width, encoded.height), (4, 3));

        let decoded = image::load_from_memory(&encoded.data).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }

    #[tokio::test]
    async fn test_jpeg_encoding_produces_jpeg() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([200, 100, 50, 255]));
        let encoded = PhotoEncoder::new().encode(image).await.unwrap();
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_save_writes_file() {
        let dir = std::env::temp_dir().join(format!("long-exposure-save-{}", uuid::Uuid::new_v4()));
        let image = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));

        let path = PhotoEncoder::new()
            .encode_and_save(image, dir.clone())
            .await
            .unwrap();

        assert!(path.starts_with(&dir));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
        assert!(std::fs::metadata(&path).unwrap().len() > 0);

        let _ = std::fs::remove_dir_all(dir);
    }
}
