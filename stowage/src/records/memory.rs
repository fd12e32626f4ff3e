//! In-memory record store

use super::model::{NewStoredFile, RecordFilter, RecordPatch, StoredFileRecord};
use super::store::{RecordError, RecordResult, RecordStore};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    records: Vec<StoredFileRecord>,
}

/// Record store keeping every record in process memory
///
/// Ids are assigned monotonically starting at 1 and the identifier is kept
/// unique, matching the SQLite store's constraints.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    inner: Mutex<Inner>,
}

impl MemoryRecordStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// Returns `true` when no record is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: NewStoredFile) -> RecordResult<StoredFileRecord> {
        let mut inner = self.inner.lock();
        if inner.records.iter().any(|r| r.uuid == record.uuid) {
            return Err(RecordError::DuplicateUuid(record.uuid));
        }

        inner.next_id += 1;
        let now = Utc::now();
        let stored = StoredFileRecord {
            id: inner.next_id,
            uuid: record.uuid,
            name: record.name,
            path: record.path,
            title: record.title,
            created_at: now,
            updated_at: now,
        };
        inner.records.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_uuid(&self, uuid: &str) -> RecordResult<Option<StoredFileRecord>> {
        Ok(self.inner.lock().records.iter().find(|r| r.uuid == uuid).cloned())
    }

    async fn find(&self, filter: &RecordFilter) -> RecordResult<Vec<StoredFileRecord>> {
        Ok(self
            .inner
            .lock()
            .records
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn update_by_uuid(&self, uuid: &str, patch: &RecordPatch) -> RecordResult<bool> {
        let mut inner = self.inner.lock();
        let Some(record) = inner.records.iter_mut().find(|r| r.uuid == uuid) else {
            return Ok(false);
        };
        if !patch.is_empty() {
            patch.apply(record);
            record.updated_at = Utc::now();
        }
        Ok(true)
    }

    async fn delete_by_uuid(&self, uuid: &str) -> RecordResult<bool> {
        let mut inner = self.inner.lock();
        let before = inner.records.len();
        inner.records.retain(|r| r.uuid != uuid);
        Ok(inner.records.len() < before)
    }

    async fn exists_by_uuid(&self, uuid: &str) -> RecordResult<bool> {
        Ok(self.inner.lock().records.iter().any(|r| r.uuid == uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_file(uuid: &str, name: &str) -> NewStoredFile {
        NewStoredFile {
            uuid: uuid.to_string(),
            name: name.to_string(),
            path: "docs".to_string(),
            title: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_monotonic_ids() {
        let store = MemoryRecordStore::new();

        let a = store.insert(new_file("a", "a.txt")).await.unwrap();
        let b = store.insert(new_file("b", "b.txt")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        store.delete_by_uuid("b").await.unwrap();
        let c = store.insert(new_file("c", "c.txt")).await.unwrap();
        assert_eq!(c.id, 3);
    }

    #[tokio::test]
    async fn test_duplicate_uuid_rejected() {
        let store = MemoryRecordStore::new();

        store.insert(new_file("a", "a.txt")).await.unwrap();
        let err = store.insert(new_file("a", "other.txt")).await.unwrap_err();
        assert!(matches!(err, RecordError::DuplicateUuid(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = MemoryRecordStore::new();
        store.insert(new_file("a", "a.txt")).await.unwrap();

        assert!(store
            .update_by_uuid("a", &RecordPatch::new().title("Alpha"))
            .await
            .unwrap());
        assert_eq!(
            store.find_by_uuid("a").await.unwrap().unwrap().title.as_deref(),
            Some("Alpha")
        );
        assert!(!store.update_by_uuid("zzz", &RecordPatch::new()).await.unwrap());

        assert!(store.delete_by_uuid("a").await.unwrap());
        assert!(!store.delete_by_uuid("a").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_find_in_insertion_order() {
        let store = MemoryRecordStore::new();
        store.insert(new_file("a", "same.txt")).await.unwrap();
        store.insert(new_file("b", "other.txt")).await.unwrap();
        store.insert(new_file("c", "same.txt")).await.unwrap();

        let found = store.find(&RecordFilter::new().name("same.txt")).await.unwrap();
        let uuids: Vec<_> = found.iter().map(|r| r.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["a", "c"]);
    }
}
