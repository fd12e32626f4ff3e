//! Blob storage trait definitions

use super::types::StorageResult;
use async_trait::async_trait;

/// Abstraction for blob storage backends
///
/// Blobs are addressed by logical, slash-separated paths such as
/// `invoices/2024/report.pdf`. The backend knows nothing about records or
/// identifiers; it only stores bytes under paths.
///
/// # Implementation Requirements
///
/// Implementations must:
/// - Treat `delete` as idempotent (deleting a missing blob is not an error)
/// - Create intermediate directories/prefixes on `write` and `move_blob`
/// - Return only direct children from `list`, never nested entries
///
/// # Examples
///
/// ```rust,no_run
/// use stowage::storage::{BlobStorage, LocalBlobStorage};
/// use std::path::PathBuf;
///
/// # async fn example() -> anyhow::Result<()> {
/// let storage = LocalBlobStorage::new(PathBuf::from("/var/stowage"))?;
///
/// storage.write("avatars", "jane.png", b"...").await?;
/// assert!(storage.exists("avatars/jane.png").await?);
///
/// let url = storage.url("avatars/jane.png").await?;
/// storage.delete("avatars/jane.png").await?;
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Writes `data` to `dir/name`, replacing any existing blob
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the backend write fails
    async fn write(&self, dir: &str, name: &str, data: &[u8]) -> StorageResult<()>;

    /// Reads the full contents of the blob at `path`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no blob exists at `path`
    async fn read(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Moves the blob at `from` to `to`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if `from` does not exist
    async fn move_blob(&self, from: &str, to: &str) -> StorageResult<()>;

    /// Deletes the blob at `path`
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend fails; a missing blob is `Ok`
    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Checks whether `path` is occupied, by a blob or by a directory of blobs
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Lists the names of the blobs stored directly under `dir`
    async fn list(&self, dir: &str) -> StorageResult<Vec<String>>;

    /// Returns the size of the blob at `path` in bytes
    async fn size(&self, path: &str) -> StorageResult<u64>;

    /// Returns the MIME type of the blob at `path`
    async fn mime_type(&self, path: &str) -> StorageResult<String>;

    /// Returns a URL under which the blob at `path` is served
    ///
    /// The format depends on the backend:
    /// - Local storage: public prefix + path (e.g., "/storage/avatars/jane.png")
    /// - Object stores: public or presigned URL
    async fn url(&self, path: &str) -> StorageResult<String>;
}

/// Guesses a MIME type from content, then from the path's extension
///
/// Shared by backends that have no stored content type.
pub(crate) fn guess_mime_type(path: &str, data: &[u8]) -> String {
    infer::get(data).map_or_else(
        || {
            mime_guess::from_path(path)
                .first_raw()
                .unwrap_or("application/octet-stream")
                .to_string()
        },
        |kind| kind.mime_type().to_string(),
    )
}
