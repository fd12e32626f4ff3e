//! Local filesystem blob storage implementation

use super::traits::{guess_mime_type, BlobStorage};
use super::types::{blob_path, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem blob storage backend
///
/// Maps logical blob paths one-to-one onto files below a base directory:
///
/// ```text
/// /var/stowage/
/// ├── invoices/2024/
/// │   ├── report.pdf
/// │   └── report_1.pdf
/// └── avatars/
///     ├── jane.png
///     └── thumbs/
///         └── jane.png
/// ```
///
/// # Examples
///
/// ```rust,no_run
/// use stowage::storage::{BlobStorage, LocalBlobStorage};
/// use std::path::PathBuf;
///
/// # async fn example() -> anyhow::Result<()> {
/// let storage = LocalBlobStorage::new(PathBuf::from("/var/stowage"))?
///     .with_url_prefix("https://cdn.example.com/files");
///
/// storage.write("avatars", "jane.png", b"...").await?;
/// // File is now at: /var/stowage/avatars/jane.png
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalBlobStorage {
    /// Base directory for blob storage
    base_path: PathBuf,

    /// Public URL prefix blobs are served under
    url_prefix: String,
}

impl LocalBlobStorage {
    /// Creates a new local blob storage instance
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` if the base path exists and is not
    /// a directory
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        // Synchronous check is OK for initialization
        if base_path.exists() && !base_path.is_dir() {
            return Err(StorageError::InvalidPath(format!(
                "{} is not a directory",
                base_path.display()
            )));
        }

        Ok(Self {
            base_path,
            url_prefix: "/storage".to_string(),
        })
    }

    /// Sets the public URL prefix used by [`BlobStorage::url`]
    #[must_use]
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the base directory
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolves a logical path to a filesystem path below the base directory
    ///
    /// Only plain path segments are accepted, so a logical path can never
    /// point outside the base directory.
    fn resolve(&self, logical: &str) -> StorageResult<PathBuf> {
        if logical.contains('\0') || logical.contains('\\') {
            return Err(StorageError::InvalidPath(logical.to_string()));
        }

        let relative = Path::new(logical.trim_start_matches('/'));
        let mut resolved = self.base_path.clone();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => resolved.push(segment),
                Component::CurDir => {}
                _ => return Err(StorageError::InvalidPath(logical.to_string())),
            }
        }
        Ok(resolved)
    }

    /// Ensures the parent directory of `path` exists
    async fn ensure_parent(path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn is_file(path: &Path) -> StorageResult<bool> {
        match fs::metadata(path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Maps a missing-file I/O error onto `StorageError::NotFound`
fn not_found_or_io(err: std::io::Error, logical: &str) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(logical.to_string())
    } else {
        StorageError::Io(err)
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    async fn write(&self, dir: &str, name: &str, data: &[u8]) -> StorageResult<()> {
        let logical = blob_path(dir, name);
        let file_path = self.resolve(&logical)?;
        Self::ensure_parent(&file_path).await?;

        let mut f = fs::File::create(&file_path).await?;
        f.write_all(data).await?;
        f.flush().await?;

        tracing::trace!(path = %logical, size = data.len(), "blob written");
        Ok(())
    }

    async fn read(&self, path: &str) -> StorageResult<Vec<u8>> {
        let file_path = self.resolve(path)?;
        fs::read(&file_path)
            .await
            .map_err(|e| not_found_or_io(e, path))
    }

    async fn move_blob(&self, from: &str, to: &str) -> StorageResult<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;

        if !Self::is_file(&source).await? {
            return Err(StorageError::NotFound(from.to_string()));
        }
        Self::ensure_parent(&target).await?;
        fs::rename(&source, &target).await?;

        tracing::trace!(from, to, "blob moved");
        Ok(())
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let file_path = self.resolve(path)?;

        // Idempotent - don't error if the file doesn't exist
        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        let file_path = self.resolve(path)?;
        // Directories count too: a blob can never be written over one
        Ok(fs::try_exists(&file_path).await?)
    }

    async fn list(&self, dir: &str) -> StorageResult<Vec<String>> {
        let dir_path = self.resolve(dir)?;

        let mut entries = match fs::read_dir(&dir_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn size(&self, path: &str) -> StorageResult<u64> {
        let file_path = self.resolve(path)?;
        let metadata = fs::metadata(&file_path)
            .await
            .map_err(|e| not_found_or_io(e, path))?;
        Ok(metadata.len())
    }

    async fn mime_type(&self, path: &str) -> StorageResult<String> {
        let data = self.read(path).await?;
        Ok(guess_mime_type(path, &data))
    }

    async fn url(&self, path: &str) -> StorageResult<String> {
        // Validates the path even though nothing is read
        self.resolve(path)?;
        Ok(format!("{}/{}", self.url_prefix, path.trim_start_matches('/')))
    }
}
