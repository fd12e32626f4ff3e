//! Blob storage abstraction and implementations
//!
//! This module provides a trait-based abstraction for the raw bytes behind
//! stored files, with two backends:
//! - Local filesystem storage (for development and single-node deployments)
//! - In-memory storage (for tests and embedding)
//!
//! # Architecture
//!
//! The `BlobStorage` trait addresses blobs by logical path (`dir/name`) and
//! knows nothing about records. Name sanitizing, uniqueness and identifiers
//! live one level up in [`crate::service::FileStorageService`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use stowage::storage::{BlobStorage, LocalBlobStorage};
//! use std::path::PathBuf;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let storage = LocalBlobStorage::new(PathBuf::from("/var/stowage"))?;
//!
//! storage.write("reports", "q3.pdf", b"%PDF-1.7").await?;
//! let data = storage.read("reports/q3.pdf").await?;
//! storage.delete("reports/q3.pdf").await?;
//! # Ok(())
//! # }
//! ```

mod local;
mod memory;
pub mod processing;
mod traits;
mod types;

pub use local::LocalBlobStorage;
pub use memory::MemoryBlobStorage;
pub use processing::{ImageProcessor, ImageResizer, ProcessingError};
#[cfg(test)]
pub use traits::MockBlobStorage;
pub use traits::BlobStorage;
pub use types::{blob_path, file_name, split_extension, HumanSize, StorageError, StorageResult, UploadedFile};
