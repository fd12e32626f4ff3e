//! Error types and error handling

use crate::records::RecordError;
use crate::storage::{ProcessingError, StorageError};
use std::fmt;
use thiserror::Error;

/// Step of the delete sequence that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStep {
    /// Removing the primary blob
    Blob,
    /// Removing the thumbnail blob
    Thumbnail,
    /// Removing the metadata record
    Record,
}

impl fmt::Display for DeleteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Blob => "blob",
            Self::Thumbnail => "thumbnail",
            Self::Record => "record",
        })
    }
}

/// File storage error type
#[derive(Debug, Error)]
pub enum FileStorageError {
    /// No live record has this identifier
    #[error("Stored file not found: {0}")]
    NotFound(String),

    /// The name is already taken under the path and suffixing is disabled
    /// or exhausted
    #[error("File {name} already exists under {path}")]
    AlreadyExists {
        /// Logical directory
        path: String,
        /// Colliding name
        name: String,
    },

    /// The content does not match its declared type
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// A valid image could not be re-encoded as a thumbnail
    #[error("Thumbnail processing failed: {0}")]
    Processing(String),

    /// Blob backend failure
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Record store failure
    #[error("Record store error: {0}")]
    Records(#[from] RecordError),

    /// A stored reference list could not be encoded or decoded
    #[error("Invalid reference list: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Delete stopped part-way; earlier steps are not rolled back
    #[error("Delete of {uuid} failed at the {step} step: {source}")]
    PartialDelete {
        /// Identifier of the record being deleted
        uuid: String,
        /// Step that failed
        step: DeleteStep,
        /// Underlying failure
        #[source]
        source: Box<Self>,
    },
}

impl FileStorageError {
    /// Returns `true` for failures originating in the blob backend, the
    /// record store or the image encoder, including partial deletes
    #[must_use]
    pub const fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::Processing(_) | Self::Storage(_) | Self::Records(_) | Self::PartialDelete { .. }
        )
    }

    /// Returns `true` if this is a `NotFound` error
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<ProcessingError> for FileStorageError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::Decode(_) => Self::InvalidSource(err.to_string()),
            ProcessingError::Encode(_) => Self::Processing(err.to_string()),
        }
    }
}

/// Result type for file storage operations
pub type Result<T> = std::result::Result<T, FileStorageError>;
