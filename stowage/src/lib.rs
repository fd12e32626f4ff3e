//! stowage: UUID-addressed file storage with metadata records
//!
//! Hosts hand files to a [`service::FileStorageService`] and get back a
//! [`records::StoredFileRecord`] whose `uuid` is the only handle they need to
//! keep. Behind that handle the service:
//!
//! - sanitizes the client's filename and makes it unique within its path
//! - writes the bytes to a pluggable blob backend
//! - derives a width-bounded thumbnail for `jpg`, `jpeg`, `png` and `gif`
//! - keeps a metadata record in a pluggable record store
//!
//! Host records that reference stored files use
//! [`mutator::AttributeMutator`] to turn submitted values (keep, replace,
//! upload, clear) into the identifiers to persist, cleaning up replaced files.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use stowage::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let blobs = LocalBlobStorage::new(PathBuf::from("./storage"))?;
//!     let records = SqliteRecordStore::connect("sqlite://./stowage.db").await?;
//!     records.migrate().await?;
//!
//!     let service = FileStorageService::new(Arc::new(blobs), Arc::new(records));
//!
//!     let upload = UploadedFile::new("Test File.pdf", "application/pdf", b"%PDF-1.7".to_vec());
//!     let record = service.store(StoreRequest::new(upload, "a/b")).await?;
//!     assert_eq!(record.name, "test-file.pdf");
//!
//!     service.delete(&record.uuid).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency
//!
//! Stores into the same path are serialized inside one service instance, so
//! two uploads of `a.pdf` become `a.pdf` and `a_1.pdf`. Separate processes
//! sharing a backend can still race on name resolution.

pub mod config;
pub mod error;
pub mod identifier;
pub mod mutator;
pub mod naming;
pub mod observability;
pub mod records;
pub mod rule;
pub mod service;
pub mod storage;
pub mod testing;
pub mod thumbnail;

pub mod prelude {
    //! Convenience re-exports for common types and traits
    //!
    //! # Examples
    //!
    //! ```rust
    //! use stowage::prelude::*;
    //! ```

    pub use crate::config::StowageConfig;
    pub use crate::error::{DeleteStep, FileStorageError};
    pub use crate::mutator::{decode_uuid_list, AttributeMutator, Decision, SubmittedFile};
    pub use crate::naming::{NameSanitizer, NamingPolicy, UniqueNameResolver};
    pub use crate::records::{
        MemoryRecordStore, RecordFilter, RecordPatch, RecordStore, SqliteRecordStore,
        StoredFileRecord,
    };
    pub use crate::rule::{RuleViolation, StoredFileRule};
    pub use crate::service::{FileSource, FileStorageService, StoreRequest};
    pub use crate::storage::{
        BlobStorage, ImageProcessor, ImageResizer, LocalBlobStorage, MemoryBlobStorage,
        StorageError, UploadedFile,
    };
    pub use crate::thumbnail::ThumbnailDeriver;
}
