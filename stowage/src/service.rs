//! File storage facade
//!
//! [`FileStorageService`] ties the blob backend, the record store and the
//! naming/thumbnail helpers together. A store runs:
//!
//! 1. sanitize the desired name (from the title or the source file name)
//! 2. derive the thumbnail in memory, if eligible
//! 3. resolve a free name and write (or move) the primary blob, holding the
//!    path lock throughout
//! 4. write the thumbnail to `path/thumbs/name`
//! 5. insert the record under a fresh identifier
//!
//! If step 4 or 5 fails, the blobs written so far are removed (an adopted blob
//! is moved back) before the error is returned.

use crate::config::StowageConfig;
use crate::error::{DeleteStep, FileStorageError, Result};
use crate::identifier::IdentifierGenerator;
use crate::naming::{NameSanitizer, PathLocks, UniqueNameResolver};
use crate::records::{
    normalize_title, NewStoredFile, RecordError, RecordFilter, RecordPatch, RecordStore,
    StoredFileRecord, THUMBNAIL_DIR,
};
use crate::storage::{
    blob_path, file_name, split_extension, BlobStorage, HumanSize, ImageProcessor, ImageResizer,
    UploadedFile,
};
use crate::thumbnail::ThumbnailDeriver;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Where the bytes of a new stored file come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// Freshly submitted bytes with the client's file name
    Upload(UploadedFile),

    /// A blob already present in the backend, adopted by moving it
    ExistingBlob {
        /// Current logical path of the blob
        path: String,
    },
}

impl FileSource {
    /// Shorthand for an upload source
    #[must_use]
    pub fn upload(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self::Upload(UploadedFile::new(filename, content_type, data))
    }

    /// Shorthand for an existing-blob source
    #[must_use]
    pub fn existing_blob(path: impl Into<String>) -> Self {
        Self::ExistingBlob { path: path.into() }
    }

    /// File name the source was submitted under
    #[must_use]
    pub fn original_name(&self) -> &str {
        match self {
            Self::Upload(file) => &file.filename,
            Self::ExistingBlob { path } => file_name(path),
        }
    }
}

impl From<UploadedFile> for FileSource {
    fn from(file: UploadedFile) -> Self {
        Self::Upload(file)
    }
}

/// Parameters of a store operation
///
/// # Examples
///
/// ```rust
/// use stowage::service::{FileSource, StoreRequest};
///
/// let request = StoreRequest::new(
///     FileSource::upload("Test File.pdf", "application/pdf", b"%PDF".to_vec()),
///     "a/b",
/// )
/// .title("Quarterly report")
/// .derive_thumbnail(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreRequest {
    /// Bytes to store
    pub source: FileSource,
    /// Logical directory to store under
    pub path: String,
    /// Display title; also used as the base of the stored name
    pub title: Option<String>,
    /// Derive a thumbnail for eligible images
    pub derive_thumbnail: bool,
}

impl StoreRequest {
    /// Creates a request with no title and thumbnails enabled
    #[must_use]
    pub fn new(source: impl Into<FileSource>, path: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            path: path.into(),
            title: None,
            derive_thumbnail: true,
        }
    }

    /// Sets the title
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Enables or disables thumbnail derivation
    #[must_use]
    pub const fn derive_thumbnail(mut self, derive: bool) -> Self {
        self.derive_thumbnail = derive;
        self
    }
}

/// Store, look up, update and delete managed files
///
/// The service is constructed explicitly and shared by reference (or in an
/// `Arc`); it holds no global state.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use stowage::records::MemoryRecordStore;
/// use stowage::service::{FileSource, FileStorageService, StoreRequest};
/// use stowage::storage::MemoryBlobStorage;
///
/// # async fn example() -> anyhow::Result<()> {
/// let service = FileStorageService::new(
///     Arc::new(MemoryBlobStorage::new()),
///     Arc::new(MemoryRecordStore::new()),
/// );
///
/// let record = service
///     .store(StoreRequest::new(
///         FileSource::upload("Test File.pdf", "application/pdf", b"%PDF".to_vec()),
///         "a/b",
///     ))
///     .await?;
///
/// assert_eq!(record.name, "test-file.pdf");
/// assert_eq!(service.get(&record.uuid).await?, record);
/// # Ok(())
/// # }
/// ```
pub struct FileStorageService {
    blobs: Arc<dyn BlobStorage>,
    records: Arc<dyn RecordStore>,
    resizer: Arc<dyn ImageResizer>,
    sanitizer: NameSanitizer,
    resolver: UniqueNameResolver,
    identifiers: IdentifierGenerator,
    thumbnails: ThumbnailDeriver,
    locks: PathLocks,
}

impl fmt::Debug for FileStorageService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStorageService")
            .field("sanitizer", &self.sanitizer)
            .field("resolver", &self.resolver)
            .field("thumbnails", &self.thumbnails)
            .finish_non_exhaustive()
    }
}

impl FileStorageService {
    /// Creates a service with default settings and the `image`-based resizer
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobStorage>, records: Arc<dyn RecordStore>) -> Self {
        Self {
            blobs,
            records,
            resizer: Arc::new(ImageProcessor::new()),
            sanitizer: NameSanitizer::default(),
            resolver: UniqueNameResolver::default().with_reserved([THUMBNAIL_DIR]),
            identifiers: IdentifierGenerator::default(),
            thumbnails: ThumbnailDeriver::default(),
            locks: PathLocks::new(),
        }
    }

    /// Applies naming, thumbnail and identifier settings
    #[must_use]
    pub fn with_config(mut self, config: &StowageConfig) -> Self {
        self.sanitizer = NameSanitizer::new(config.naming.max_len);
        self.resolver = UniqueNameResolver::new(config.naming.policy)
            .with_max_suffix(config.naming.max_suffix)
            .with_reserved([THUMBNAIL_DIR]);
        self.identifiers = IdentifierGenerator::new(config.database.identifier_attempts);
        self.thumbnails = ThumbnailDeriver::new(config.thumbnails.clone());
        self
    }

    /// Replaces the image resizer
    #[must_use]
    pub fn with_resizer(mut self, resizer: Arc<dyn ImageResizer>) -> Self {
        self.resizer = resizer;
        self
    }

    /// Blob backend in use
    #[must_use]
    pub fn blob_storage(&self) -> &dyn BlobStorage {
        self.blobs.as_ref()
    }

    /// Record store in use
    #[must_use]
    pub fn record_store(&self) -> &dyn RecordStore {
        self.records.as_ref()
    }

    /// Name sanitizer in use
    #[must_use]
    pub const fn sanitizer(&self) -> &NameSanitizer {
        &self.sanitizer
    }

    /// Returns the live record with this identifier
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record matches
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, uuid: &str) -> Result<StoredFileRecord> {
        self.records
            .find_by_uuid(uuid)
            .await?
            .ok_or_else(|| FileStorageError::NotFound(uuid.to_string()))
    }

    /// Returns every record matching `filter`, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if the record store fails
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, filter: &RecordFilter) -> Result<Vec<StoredFileRecord>> {
        Ok(self.records.find(filter).await?)
    }

    /// Stores a new file and returns its record
    ///
    /// # Errors
    ///
    /// - `InvalidSource` if an image-named source does not decode
    /// - `Processing` if a decoded image cannot be encoded as a thumbnail
    /// - `AlreadyExists` if the name is taken and the naming policy rejects
    ///   collisions
    /// - `Storage` / `Records` on backend failures (after compensation)
    #[tracing::instrument(
        skip(self, request),
        fields(path = %request.path, original = %request.source.original_name())
    )]
    pub async fn store(&self, request: StoreRequest) -> Result<StoredFileRecord> {
        let StoreRequest {
            source,
            path,
            title,
            derive_thumbnail,
        } = request;

        let original = source.original_name().to_string();
        let (original_base, extension) = split_extension(&original);
        let title = normalize_title(title);
        let desired = match &title {
            Some(title) => self.sanitizer.sanitize_parts(title, extension),
            None => self.sanitizer.sanitize(&original),
        };
        let title = title.or_else(|| normalize_title(Some(original_base.to_string())));

        let thumbnail = if derive_thumbnail && self.is_thumbnail_eligible(&source, &desired) {
            Some(self.derive_thumbnail(&source).await?)
        } else {
            None
        };

        let name = {
            let _guard = self.locks.lock(&path).await;
            let name = self
                .resolver
                .resolve(self.blobs.as_ref(), &path, &desired)
                .await?;
            self.write_primary(&source, &path, &name).await?;
            name
        };

        match self.finish_store(&path, &name, title, thumbnail.as_deref()).await {
            Ok(record) => {
                tracing::debug!(uuid = %record.uuid, name = %record.name, "stored file");
                Ok(record)
            }
            Err(err) => {
                self.compensate(&source, &path, &name).await;
                Err(err)
            }
        }
    }

    /// Merges `patch` into the record
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record matches
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, uuid: &str, patch: &RecordPatch) -> Result<()> {
        if self.records.update_by_uuid(uuid, patch).await? {
            Ok(())
        } else {
            Err(FileStorageError::NotFound(uuid.to_string()))
        }
    }

    /// Removes the blob, its thumbnail and the record, in that order
    ///
    /// Stops at the first failure. A failure after the blob is gone is
    /// reported as `PartialDelete` naming the failed step; nothing is
    /// restored.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record matches, `Storage` if the blob cannot
    /// be removed, `PartialDelete` for later steps
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, uuid: &str) -> Result<()> {
        let record = self.get(uuid).await?;

        self.blobs.delete(&record.pathname()).await?;

        let partial = |step: DeleteStep, source: FileStorageError| FileStorageError::PartialDelete {
            uuid: uuid.to_string(),
            step,
            source: Box::new(source),
        };

        let thumbnail = self.thumbnails.thumbnail_path(&record.path, &record.name);
        let has_thumbnail = self
            .blobs
            .exists(&thumbnail)
            .await
            .map_err(|e| partial(DeleteStep::Thumbnail, e.into()))?;
        if has_thumbnail {
            self.blobs
                .delete(&thumbnail)
                .await
                .map_err(|e| partial(DeleteStep::Thumbnail, e.into()))?;
        }

        let removed = self
            .records
            .delete_by_uuid(uuid)
            .await
            .map_err(|e| partial(DeleteStep::Record, e.into()))?;
        if !removed {
            return Err(partial(
                DeleteStep::Record,
                FileStorageError::NotFound(uuid.to_string()),
            ));
        }

        tracing::debug!(path = %record.pathname(), has_thumbnail, "deleted file");
        Ok(())
    }

    /// Public URL of the blob
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot build the URL
    pub async fn url(&self, record: &StoredFileRecord) -> Result<String> {
        Ok(self.blobs.url(&record.pathname()).await?)
    }

    /// Returns `true` if a thumbnail blob exists for the record
    ///
    /// # Errors
    ///
    /// Returns an error if the backend check fails
    pub async fn has_thumbnail(&self, record: &StoredFileRecord) -> Result<bool> {
        let path = self.thumbnails.thumbnail_path(&record.path, &record.name);
        Ok(self.blobs.exists(&path).await?)
    }

    /// Public URL of the thumbnail, `None` if the record has none
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails
    pub async fn thumbnail_url(&self, record: &StoredFileRecord) -> Result<Option<String>> {
        if !self.has_thumbnail(record).await? {
            return Ok(None);
        }
        let path = self.thumbnails.thumbnail_path(&record.path, &record.name);
        Ok(Some(self.blobs.url(&path).await?))
    }

    /// Size of the blob in bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is missing
    pub async fn size(&self, record: &StoredFileRecord) -> Result<u64> {
        Ok(self.blobs.size(&record.pathname()).await?)
    }

    /// Size of the blob for display, e.g. `1.5 MB`
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is missing
    pub async fn human_size(&self, record: &StoredFileRecord) -> Result<HumanSize> {
        Ok(HumanSize(self.size(record).await?))
    }

    /// MIME type of the blob
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is missing
    pub async fn mime_type(&self, record: &StoredFileRecord) -> Result<String> {
        Ok(self.blobs.mime_type(&record.pathname()).await?)
    }

    /// Contents of the blob
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is missing
    pub async fn read(&self, record: &StoredFileRecord) -> Result<Vec<u8>> {
        Ok(self.blobs.read(&record.pathname()).await?)
    }

    fn is_thumbnail_eligible(&self, source: &FileSource, name: &str) -> bool {
        match source {
            FileSource::Upload(file) => self.thumbnails.is_eligible_upload(name, &file.content_type),
            FileSource::ExistingBlob { .. } => self.thumbnails.is_eligible(name),
        }
    }

    async fn derive_thumbnail(&self, source: &FileSource) -> Result<Vec<u8>> {
        let bytes: Cow<'_, [u8]> = match source {
            FileSource::Upload(file) => Cow::Borrowed(file.data.as_slice()),
            FileSource::ExistingBlob { path } => Cow::Owned(self.blobs.read(path).await?),
        };
        self.thumbnails.derive(self.resizer.as_ref(), &bytes)
    }

    async fn write_primary(&self, source: &FileSource, path: &str, name: &str) -> Result<()> {
        match source {
            FileSource::Upload(file) => self.blobs.write(path, name, &file.data).await?,
            FileSource::ExistingBlob { path: from } => {
                self.blobs.move_blob(from, &blob_path(path, name)).await?;
            }
        }
        Ok(())
    }

    async fn finish_store(
        &self,
        path: &str,
        name: &str,
        title: Option<String>,
        thumbnail: Option<&[u8]>,
    ) -> Result<StoredFileRecord> {
        if let Some(bytes) = thumbnail {
            self.blobs
                .write(&self.thumbnails.thumbnail_dir(path), name, bytes)
                .await?;
        }

        let mut retried = false;
        loop {
            let uuid = self.identifiers.generate(self.records.as_ref()).await?;
            let record = NewStoredFile {
                uuid,
                name: name.to_string(),
                path: path.to_string(),
                title: title.clone(),
            };
            match self.records.insert(record).await {
                Err(RecordError::DuplicateUuid(uuid)) if !retried => {
                    tracing::warn!(%uuid, "identifier claimed concurrently, retrying");
                    retried = true;
                }
                result => return Ok(result?),
            }
        }
    }

    /// Best-effort removal of what a failed store wrote
    async fn compensate(&self, source: &FileSource, path: &str, name: &str) {
        let thumbnail = self.thumbnails.thumbnail_path(path, name);
        if let Err(err) = self.blobs.delete(&thumbnail).await {
            tracing::warn!(%thumbnail, error = %err, "failed to remove thumbnail of failed store");
        }

        let target = blob_path(path, name);
        let undo = match source {
            FileSource::Upload(_) => self.blobs.delete(&target).await,
            FileSource::ExistingBlob { path: from } => self.blobs.move_blob(&target, from).await,
        };
        if let Err(err) = undo {
            tracing::warn!(%target, error = %err, "failed to undo primary write of failed store");
        }
    }
}
