//! Record store trait definitions

use super::model::{NewStoredFile, RecordFilter, RecordPatch, StoredFileRecord};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by record stores
#[derive(Debug, Error)]
pub enum RecordError {
    /// The identifier is already taken by another record
    ///
    /// Raised by the store's unique constraint; callers treat it as a
    /// retryable identifier collision.
    #[error("Identifier already in use: {0}")]
    DuplicateUuid(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// No unused identifier could be generated
    #[error("No unused identifier found after {0} attempts")]
    Exhausted(u32),
}

/// Result type for record store operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Persistent store of [`StoredFileRecord`]s
///
/// Records are keyed by an internal numeric id (assigned on insert) and by a
/// unique `uuid`. Implementations must reject a second record with the same
/// `uuid` with [`RecordError::DuplicateUuid`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a record, assigning its id and timestamps
    async fn insert(&self, record: NewStoredFile) -> RecordResult<StoredFileRecord>;

    /// Looks up a record by identifier
    async fn find_by_uuid(&self, uuid: &str) -> RecordResult<Option<StoredFileRecord>>;

    /// Returns every record matching `filter`, oldest first
    async fn find(&self, filter: &RecordFilter) -> RecordResult<Vec<StoredFileRecord>>;

    /// Applies `patch` to the record; returns `false` if no record matched
    async fn update_by_uuid(&self, uuid: &str, patch: &RecordPatch) -> RecordResult<bool>;

    /// Deletes the record; returns `false` if no record matched
    async fn delete_by_uuid(&self, uuid: &str) -> RecordResult<bool>;

    /// Checks whether a record with this identifier exists
    async fn exists_by_uuid(&self, uuid: &str) -> RecordResult<bool>;
}
