//! Testing utilities for code built on stowage
//!
//! - [`create_test_png`] produces real, decodable image bytes of any size
//! - [`TestStorage`] wires a [`FileStorageService`] to in-memory backends and
//!   keeps handles to them for assertions
//!
//! # Example
//!
//! ```rust
//! use stowage::service::{FileSource, StoreRequest};
//! use stowage::testing::{create_test_png, TestStorage};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let storage = TestStorage::new();
//!
//! let png = FileSource::upload("photo.png", "image/png", create_test_png(400, 800));
//! storage.service.store(StoreRequest::new(png, "a/b")).await?;
//!
//! assert!(storage.blobs.paths().contains(&"a/b/thumbs/photo.png".to_string()));
//! # Ok(())
//! # }
//! ```

use crate::config::StowageConfig;
use crate::records::MemoryRecordStore;
use crate::service::FileStorageService;
use crate::storage::MemoryBlobStorage;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;

/// Encodes a `width` x `height` gradient as PNG
///
/// # Panics
///
/// Panics if PNG encoding fails, which does not happen for in-memory buffers
#[must_use]
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    #[allow(clippy::cast_possible_truncation)]
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });

    let mut buffer = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("PNG encoding into memory");
    buffer
}

/// A file storage service over in-memory backends
pub struct TestStorage {
    /// The service under test
    pub service: FileStorageService,
    /// Blob backend, for inspecting written paths
    pub blobs: Arc<MemoryBlobStorage>,
    /// Record store, for inspecting persisted records
    pub records: Arc<MemoryRecordStore>,
}

impl Default for TestStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TestStorage {
    /// Creates a service with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&StowageConfig::default())
    }

    /// Creates a service with the given settings
    #[must_use]
    pub fn with_config(config: &StowageConfig) -> Self {
        let blobs = Arc::new(MemoryBlobStorage::new());
        let records = Arc::new(MemoryRecordStore::new());
        let service =
            FileStorageService::new(blobs.clone(), records.clone()).with_config(config);
        Self {
            service,
            blobs,
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_fixture_decodes() {
        let png = create_test_png(7, 3);
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!((img.width(), img.height()), (7, 3));
    }

    #[test]
    fn test_storage_starts_empty() {
        let storage = TestStorage::new();
        assert!(storage.blobs.is_empty());
        assert!(storage.records.is_empty());
    }
}
