//! Collision-free name resolution within a logical directory

use crate::error::{FileStorageError, Result};
use crate::storage::{blob_path, split_extension, BlobStorage};
use serde::{Deserialize, Serialize};

/// Default upper bound on the numeric suffix tried before giving up
pub const DEFAULT_MAX_SUFFIX: u32 = 10_000;

/// What to do when the desired name is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingPolicy {
    /// Append `_1`, `_2`, ... before the extension until a name is free
    #[default]
    Suffix,
    /// Fail with `AlreadyExists` on any collision
    Reject,
}

/// Finds a name not currently occupied under a path
///
/// The check is performed against the blob backend on every candidate, so
/// the result is only guaranteed free at the moment of the check. Callers
/// that write concurrently to the same path hold a [`super::PathLocks`]
/// guard across resolution and write.
///
/// Reserved names are treated as taken regardless of the backend, compared
/// case-insensitively. The storage service reserves the thumbnail directory.
///
/// # Examples
///
/// ```rust
/// use stowage::naming::UniqueNameResolver;
/// use stowage::storage::{BlobStorage, MemoryBlobStorage};
///
/// # async fn example() -> anyhow::Result<()> {
/// let storage = MemoryBlobStorage::new();
/// let resolver = UniqueNameResolver::default();
///
/// storage.write("docs", "report.pdf", b"%PDF").await?;
/// let name = resolver.resolve(&storage, "docs", "report.pdf").await?;
/// assert_eq!(name, "report_1.pdf");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueNameResolver {
    policy: NamingPolicy,
    max_suffix: u32,
    reserved: Vec<String>,
}

impl Default for UniqueNameResolver {
    fn default() -> Self {
        Self::new(NamingPolicy::Suffix)
    }
}

impl UniqueNameResolver {
    /// Creates a resolver with the given policy
    #[must_use]
    pub const fn new(policy: NamingPolicy) -> Self {
        Self {
            policy,
            max_suffix: DEFAULT_MAX_SUFFIX,
            reserved: Vec::new(),
        }
    }

    /// Overrides the highest suffix tried
    #[must_use]
    pub fn with_max_suffix(mut self, max_suffix: u32) -> Self {
        self.max_suffix = max_suffix;
        self
    }

    /// Adds names that are never handed out
    #[must_use]
    pub fn with_reserved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved
            .extend(names.into_iter().map(|name| name.into().to_lowercase()));
        self
    }

    fn is_reserved(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.reserved.iter().any(|reserved| *reserved == name)
    }

    async fn is_taken(&self, storage: &dyn BlobStorage, path: &str, name: &str) -> Result<bool> {
        Ok(self.is_reserved(name) || storage.exists(&blob_path(path, name)).await?)
    }

    /// Active policy
    #[must_use]
    pub const fn policy(&self) -> NamingPolicy {
        self.policy
    }

    /// Returns the first free name among `desired`, `desired_1`, `desired_2`, ...
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` when the policy is `Reject` and `desired` is
    /// taken, or when every suffix up to the bound is taken. Backend errors
    /// are propagated.
    pub async fn resolve(
        &self,
        storage: &dyn BlobStorage,
        path: &str,
        desired: &str,
    ) -> Result<String> {
        if !self.is_taken(storage, path, desired).await? {
            return Ok(desired.to_string());
        }

        if self.policy == NamingPolicy::Reject {
            return Err(already_exists(path, desired));
        }

        for n in 1..=self.max_suffix {
            let candidate = suffixed(desired, n);
            if !self.is_taken(storage, path, &candidate).await? {
                tracing::debug!(path, desired, name = %candidate, "resolved name collision");
                return Ok(candidate);
            }
        }

        Err(already_exists(path, desired))
    }
}

fn already_exists(path: &str, name: &str) -> FileStorageError {
    FileStorageError::AlreadyExists {
        path: path.to_string(),
        name: name.to_string(),
    }
}

/// Inserts `_n` before the last extension separator
///
/// # Examples
///
/// ```rust
/// use stowage::naming::suffixed;
///
/// assert_eq!(suffixed("name.ext", 1), "name_1.ext");
/// assert_eq!(suffixed("name", 2), "name_2");
/// ```
#[must_use]
pub fn suffixed(name: &str, n: u32) -> String {
    match split_extension(name) {
        (base, Some(ext)) => format!("{base}_{n}.{ext}"),
        (base, None) => format!("{base}_{n}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryBlobStorage, MockBlobStorage, StorageError};

    #[tokio::test]
    async fn test_free_name_is_kept() {
        let storage = MemoryBlobStorage::new();
        let resolver = UniqueNameResolver::default();

        let name = resolver.resolve(&storage, "a/b", "test-file.pdf").await.unwrap();
        assert_eq!(name, "test-file.pdf");
    }

    #[tokio::test]
    async fn test_suffixes_increase_in_order() {
        let storage = MemoryBlobStorage::new();
        let resolver = UniqueNameResolver::default();

        storage.write("a/b", "test-file.pdf", b"1").await.unwrap();
        assert_eq!(
            resolver.resolve(&storage, "a/b", "test-file.pdf").await.unwrap(),
            "test-file_1.pdf"
        );

        storage.write("a/b", "test-file_1.pdf", b"2").await.unwrap();
        assert_eq!(
            resolver.resolve(&storage, "a/b", "test-file.pdf").await.unwrap(),
            "test-file_2.pdf"
        );
    }

    #[tokio::test]
    async fn test_first_gap_is_reused() {
        let storage = MemoryBlobStorage::new();
        let resolver = UniqueNameResolver::default();

        storage.write("p", "x", b"").await.unwrap();
        storage.write("p", "x_2", b"").await.unwrap();
        assert_eq!(resolver.resolve(&storage, "p", "x").await.unwrap(), "x_1");
    }

    #[tokio::test]
    async fn test_other_paths_do_not_collide() {
        let storage = MemoryBlobStorage::new();
        let resolver = UniqueNameResolver::default();

        storage.write("a", "same.txt", b"").await.unwrap();
        assert_eq!(resolver.resolve(&storage, "b", "same.txt").await.unwrap(), "same.txt");
    }

    #[tokio::test]
    async fn test_reject_policy() {
        let storage = MemoryBlobStorage::new();
        let resolver = UniqueNameResolver::new(NamingPolicy::Reject);

        assert_eq!(resolver.resolve(&storage, "p", "a.txt").await.unwrap(), "a.txt");

        storage.write("p", "a.txt", b"").await.unwrap();
        let err = resolver.resolve(&storage, "p", "a.txt").await.unwrap_err();
        assert!(matches!(err, FileStorageError::AlreadyExists { name, .. } if name == "a.txt"));
    }

    #[tokio::test]
    async fn test_exhausted_suffixes() {
        let storage = MemoryBlobStorage::new();
        let resolver = UniqueNameResolver::default().with_max_suffix(2);

        for name in ["a.txt", "a_1.txt", "a_2.txt"] {
            storage.write("p", name, b"").await.unwrap();
        }
        let err = resolver.resolve(&storage, "p", "a.txt").await.unwrap_err();
        assert!(matches!(err, FileStorageError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_reserved_name_is_suffixed() {
        let storage = MemoryBlobStorage::new();
        let resolver = UniqueNameResolver::default().with_reserved(["thumbs"]);

        assert_eq!(resolver.resolve(&storage, "p", "thumbs").await.unwrap(), "thumbs_1");
        assert_eq!(resolver.resolve(&storage, "p", "Thumbs").await.unwrap(), "Thumbs_1");
        assert_eq!(resolver.resolve(&storage, "p", "thumbs.png").await.unwrap(), "thumbs.png");

        let err = UniqueNameResolver::new(NamingPolicy::Reject)
            .with_reserved(["thumbs"])
            .resolve(&storage, "p", "thumbs")
            .await
            .unwrap_err();
        assert!(matches!(err, FileStorageError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let mut storage = MockBlobStorage::new();
        storage
            .expect_exists()
            .returning(|_| Err(StorageError::Other("offline".to_string())));

        let err = UniqueNameResolver::default()
            .resolve(&storage, "p", "a.txt")
            .await
            .unwrap_err();
        assert!(err.is_backend_failure());
    }

    #[test]
    fn test_policy_deserialize() {
        let policy: NamingPolicy = serde_json::from_str(r#""reject""#).unwrap();
        assert_eq!(policy, NamingPolicy::Reject);
    }
}
