//! Image processing for thumbnail derivation
//!
//! The [`ImageResizer`] trait is the seam the storage service derives
//! thumbnails through; [`ImageProcessor`] implements it on top of the
//! `image` crate.
//!
//! # Examples
//!
//! ```rust,no_run
//! use stowage::storage::processing::{ImageProcessor, ImageResizer};
//!
//! # fn example(png_bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let processor = ImageProcessor::new();
//!
//! // Scale down to at most 300px wide, keeping the aspect ratio
//! let thumbnail = processor.resize(png_bytes, 300)?;
//!
//! let (width, height) = processor.dimensions(&thumbnail)?;
//! assert!(width <= 300);
//! # Ok(())
//! # }
//! ```

use image::{imageops::FilterType, DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use thiserror::Error;

/// Errors raised while processing image bytes
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The bytes could not be decoded as an image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The processed image could not be encoded
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Width-bounded image resizing
///
/// Implementations must preserve the aspect ratio and must never enlarge an
/// image that is already narrower than `max_width`.
pub trait ImageResizer: Send + Sync {
    /// Resizes `bytes` so the result is at most `max_width` pixels wide
    ///
    /// # Errors
    ///
    /// Returns `ProcessingError::Decode` if `bytes` is not a decodable image
    fn resize(&self, bytes: &[u8], max_width: u32) -> Result<Vec<u8>, ProcessingError>;
}

/// Image processing utilities
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    /// Filter used when scaling down
    filter: FilterType,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProcessor {
    /// Creates a new image processor with default settings
    ///
    /// Uses `FilterType::Lanczos3` for high-quality resizing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }

    /// Creates a processor with a specific resize filter
    ///
    /// # Examples
    ///
    /// ```rust
    /// use stowage::storage::processing::ImageProcessor;
    /// use image::imageops::FilterType;
    ///
    /// let processor = ImageProcessor::with_filter(FilterType::Nearest);
    /// ```
    #[must_use]
    pub const fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }

    /// Detects the encoded format of `bytes`
    fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ProcessingError> {
        image::guess_format(bytes).map_err(|e| ProcessingError::Decode(e.to_string()))
    }

    /// Decodes `bytes` in the given format
    fn load_image(bytes: &[u8], format: ImageFormat) -> Result<DynamicImage, ProcessingError> {
        ImageReader::with_format(Cursor::new(bytes), format)
            .decode()
            .map_err(|e| ProcessingError::Decode(e.to_string()))
    }

    /// Encodes an image to bytes
    fn encode_image(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ProcessingError> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), format)
            .map_err(|e| ProcessingError::Encode(e.to_string()))?;
        Ok(buffer)
    }

    /// Gets image dimensions without fully decoding
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a valid image
    pub fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), ProcessingError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ProcessingError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| ProcessingError::Decode(e.to_string()))
    }
}

/// Computes the target size for a width bound, never enlarging
///
/// The height follows the width proportionally and never drops below 1px.
#[must_use]
pub fn bounded_size(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let scaled = (u64::from(height) * u64::from(max_width) + u64::from(width) / 2) / u64::from(width);
    let scaled = u32::try_from(scaled).unwrap_or(u32::MAX).max(1);
    (max_width, scaled)
}

impl ImageResizer for ImageProcessor {
    fn resize(&self, bytes: &[u8], max_width: u32) -> Result<Vec<u8>, ProcessingError> {
        let format = Self::detect_format(bytes)?;
        let img = Self::load_image(bytes, format)?;

        let (width, height) = bounded_size(img.width(), img.height(), max_width);
        if (width, height) == (img.width(), img.height()) {
            // Already narrow enough; the decoded source is kept as-is
            return Ok(bytes.to_vec());
        }

        let resized = img.resize_exact(width, height, self.filter);
        Self::encode_image(&resized, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::create_test_png;

    #[test]
    fn test_dimensions() {
        let png_data = create_test_png(10, 20);
        let processor = ImageProcessor::new();

        assert_eq!(processor.dimensions(&png_data).unwrap(), (10, 20));
    }

    #[test]
    fn test_resize_preserves_aspect_ratio() {
        let png_data = create_test_png(400, 800);
        let processor = ImageProcessor::new();

        let resized = processor.resize(&png_data, 300).unwrap();
        assert_eq!(processor.dimensions(&resized).unwrap(), (300, 600));
    }

    #[test]
    fn test_resize_never_upsizes() {
        let png_data = create_test_png(100, 50);
        let processor = ImageProcessor::new();

        let resized = processor.resize(&png_data, 300).unwrap();
        assert_eq!(processor.dimensions(&resized).unwrap(), (100, 50));
        assert_eq!(resized, png_data);
    }

    #[test]
    fn test_resize_keeps_format() {
        let png_data = create_test_png(600, 300);
        let processor = ImageProcessor::with_filter(FilterType::Nearest);

        let resized = processor.resize(&png_data, 300).unwrap();
        assert_eq!(image::guess_format(&resized).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_invalid_image() {
        let processor = ImageProcessor::new();

        assert!(matches!(
            processor.resize(b"not an image", 300).unwrap_err(),
            ProcessingError::Decode(_)
        ));
        assert!(processor.dimensions(b"not an image").is_err());
    }

    #[test]
    fn test_bounded_size() {
        assert_eq!(bounded_size(400, 800, 300), (300, 600));
        assert_eq!(bounded_size(100, 50, 300), (100, 50));
        assert_eq!(bounded_size(300, 10, 300), (300, 10));
        assert_eq!(bounded_size(3000, 1, 300), (300, 1));
        assert_eq!(bounded_size(1000, 333, 300), (300, 100));
    }
}
