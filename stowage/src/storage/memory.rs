//! In-memory blob storage implementation

use super::traits::{guess_mime_type, BlobStorage};
use super::types::{blob_path, StorageError, StorageResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// In-memory blob storage backend
///
/// Keeps every blob in a map keyed by logical path. Intended for tests and
/// for embedding where persistence is not required.
#[derive(Debug)]
pub struct MemoryBlobStorage {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
    url_prefix: String,
}

impl Default for MemoryBlobStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobStorage {
    /// Creates an empty store serving URLs under `/storage`
    #[must_use]
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(BTreeMap::new()),
            url_prefix: "/storage".to_string(),
        }
    }

    /// Returns all stored logical paths in order
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.blobs.read().keys().cloned().collect()
    }

    /// Returns the number of stored blobs
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Returns `true` when no blob is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn write(&self, dir: &str, name: &str, data: &[u8]) -> StorageResult<()> {
        self.blobs
            .write()
            .insert(normalize(&blob_path(dir, name)), data.to_vec());
        Ok(())
    }

    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        self.blobs
            .read()
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn move_blob(&self, from: &str, to: &str) -> StorageResult<()> {
        let mut blobs = self.blobs.write();
        let data = blobs
            .remove(&normalize(from))
            .ok_or_else(|| StorageError::NotFound(from.to_string()))?;
        blobs.insert(normalize(to), data);
        Ok(())
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        self.blobs.write().remove(&normalize(path));
        Ok(())
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let path = normalize(path);
        let prefix = format!("{path}/");
        let blobs = self.blobs.read();
        Ok(blobs.contains_key(&path)
            || blobs
                .range(prefix.clone()..)
                .next()
                .is_some_and(|(key, _)| key.starts_with(&prefix)))
    }

    async fn list(&self, dir: &str) -> StorageResult<Vec<String>> {
        let dir = normalize(dir);
        let prefix = if dir.is_empty() { String::new() } else { format!("{dir}/") };

        let names = self
            .blobs
            .read()
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(ToString::to_string)
            .collect();
        Ok(names)
    }

    async fn size(&self, path: &str) -> StorageResult<u64> {
        self.blobs
            .read()
            .get(&normalize(path))
            .map(|data| data.len() as u64)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn mime_type(&self, path: &str) -> StorageResult<String> {
        let data = self.read(path).await?;
        Ok(guess_mime_type(path, &data))
    }

    async fn url(&self, path: &str) -> StorageResult<String> {
        Ok(format!("{}/{}", self.url_prefix, normalize(path)))
    }
}
