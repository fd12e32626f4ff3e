//! File metadata records
//!
//! A [`StoredFileRecord`] is the only persistent entity: it ties an opaque
//! `uuid` handle to the blob at `path/name`. The [`RecordStore`] trait is the
//! seam to the persistent store, with a SQLite implementation for production
//! and an in-memory one for tests.

mod memory;
mod model;
mod sqlite;
mod store;

pub use memory::MemoryRecordStore;
pub use model::{NewStoredFile, RecordFilter, RecordPatch, StoredFileRecord, THUMBNAIL_DIR};
pub(crate) use model::normalize_title;
pub use sqlite::SqliteRecordStore;
#[cfg(test)]
pub use store::MockRecordStore;
pub use store::{RecordError, RecordResult, RecordStore};
