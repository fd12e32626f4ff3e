//! Reconciling file-reference attributes of host records
//!
//! Host entities keep references to stored files as plain identifiers (or a
//! JSON array of them). When the host saves such an entity, the submitted
//! value is one of:
//!
//! - a reference to an existing record (`{"stored_file_uuid": "..."}`)
//! - a fresh upload
//! - nothing
//!
//! [`AttributeMutator`] turns that into the identifier(s) to persist, storing
//! uploads and deleting files that were replaced.

use crate::error::Result;
use crate::records::StoredFileRecord;
use crate::service::{FileSource, FileStorageService, StoreRequest};
use crate::storage::UploadedFile;
use serde::Deserialize;

/// A submitted value for a file-reference attribute
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "FileReference")]
pub enum SubmittedFile {
    /// Keep or switch to an existing record
    Existing {
        /// Identifier of the chosen record
        uuid: String,
    },

    /// Store a new file
    New(FileSource),
}

impl SubmittedFile {
    /// Reference to an existing record
    #[must_use]
    pub fn existing(uuid: impl Into<String>) -> Self {
        Self::Existing { uuid: uuid.into() }
    }

    /// Fresh upload
    #[must_use]
    pub fn upload(file: UploadedFile) -> Self {
        Self::New(FileSource::Upload(file))
    }
}

/// Wire shape of a reference to an existing record
#[derive(Debug, Clone, Deserialize)]
pub struct FileReference {
    /// Identifier of the referenced record
    pub stored_file_uuid: String,
}

impl From<FileReference> for SubmittedFile {
    fn from(reference: FileReference) -> Self {
        Self::Existing {
            uuid: reference.stored_file_uuid,
        }
    }
}

/// Verdict of an admission callback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Decision {
    /// Go ahead
    #[default]
    Accept,
    /// Leave the attribute as it was
    Reject,
}

type UploadHook = Box<dyn Fn(&FileSource) -> Decision + Send + Sync>;
type ExistingHook = Box<dyn Fn(&StoredFileRecord) -> Decision + Send + Sync>;

/// Computes the new value of a file-reference attribute
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use stowage::mutator::{AttributeMutator, Decision, SubmittedFile};
/// use stowage::records::MemoryRecordStore;
/// use stowage::service::FileStorageService;
/// use stowage::storage::{MemoryBlobStorage, UploadedFile};
///
/// # async fn example() -> anyhow::Result<()> {
/// let service = FileStorageService::new(
///     Arc::new(MemoryBlobStorage::new()),
///     Arc::new(MemoryRecordStore::new()),
/// );
///
/// let mutator = AttributeMutator::new(&service, "avatars")
///     .on_upload(|source| {
///         if source.original_name().ends_with(".png") {
///             Decision::Accept
///         } else {
///             Decision::Reject
///         }
///     });
///
/// let upload = SubmittedFile::upload(UploadedFile::new("me.pdf", "application/pdf", vec![1]));
/// let value = mutator.mutate_single(Some(upload), Some("previous-uuid")).await?;
/// assert_eq!(value.as_deref(), Some("previous-uuid"));
/// # Ok(())
/// # }
/// ```
pub struct AttributeMutator<'a> {
    service: &'a FileStorageService,
    storage_path: String,
    delete_replaced: bool,
    on_upload: UploadHook,
    on_existing_chosen: ExistingHook,
}

impl<'a> AttributeMutator<'a> {
    /// Creates a mutator storing uploads under `storage_path`
    ///
    /// Replaced files are kept unless [`Self::delete_replaced`] opts in, and
    /// every candidate is accepted.
    #[must_use]
    pub fn new(service: &'a FileStorageService, storage_path: impl Into<String>) -> Self {
        Self {
            service,
            storage_path: storage_path.into(),
            delete_replaced: false,
            on_upload: Box::new(|_| Decision::Accept),
            on_existing_chosen: Box::new(|_| Decision::Accept),
        }
    }

    /// Whether files dropped from the attribute are deleted
    #[must_use]
    pub const fn delete_replaced(mut self, delete: bool) -> Self {
        self.delete_replaced = delete;
        self
    }

    /// Admission check for uploads
    #[must_use]
    pub fn on_upload<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FileSource) -> Decision + Send + Sync + 'static,
    {
        self.on_upload = Box::new(hook);
        self
    }

    /// Admission check for a chosen existing record
    #[must_use]
    pub fn on_existing_chosen<F>(mut self, hook: F) -> Self
    where
        F: Fn(&StoredFileRecord) -> Decision + Send + Sync + 'static,
    {
        self.on_existing_chosen = Box::new(hook);
        self
    }

    /// New value of a single-file attribute
    ///
    /// A rejected candidate keeps `existing`. Otherwise, when the result
    /// differs from `existing` and replaced files are deleted, the record at
    /// `existing` is deleted.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if a referenced or replaced record does not exist,
    /// or any store/delete failure
    #[tracing::instrument(skip(self, value), fields(path = %self.storage_path))]
    pub async fn mutate_single(
        &self,
        value: Option<SubmittedFile>,
        existing: Option<&str>,
    ) -> Result<Option<String>> {
        let result = match value {
            None => None,
            Some(value) => match self.admit(value).await? {
                Some(uuid) => Some(uuid),
                None => return Ok(existing.map(str::to_string)),
            },
        };

        if let Some(old) = existing {
            if self.delete_replaced && result.as_deref() != Some(old) {
                self.delete_replaced_file(old).await?;
            }
        }

        Ok(result)
    }

    /// New value of a multi-file attribute, JSON-encoded
    ///
    /// Each submitted element is handled like a single value without a
    /// previous value, so a rejected element is dropped. Previous entries
    /// missing from the result are deleted when replaced files are deleted.
    /// Returns `None` when nothing remains.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if a referenced or replaced record does not exist,
    /// or any store/delete failure
    #[tracing::instrument(skip(self, values), fields(path = %self.storage_path))]
    pub async fn mutate_array(
        &self,
        values: Option<Vec<SubmittedFile>>,
        existing: &[String],
    ) -> Result<Option<String>> {
        let mut result = Vec::new();
        for value in values.into_iter().flatten() {
            if let Some(uuid) = self.admit(value).await? {
                result.push(uuid);
            }
        }

        if self.delete_replaced {
            for old in existing.iter().filter(|old| !result.contains(old)) {
                self.delete_replaced_file(old).await?;
            }
        }

        if result.is_empty() {
            Ok(None)
        } else {
            Ok(Some(serde_json::to_string(&result)?))
        }
    }

    /// Resolves one submitted value; `None` means rejected
    async fn admit(&self, value: SubmittedFile) -> Result<Option<String>> {
        match value {
            SubmittedFile::Existing { uuid } => {
                let record = self.service.get(&uuid).await?;
                if (self.on_existing_chosen)(&record) == Decision::Reject {
                    tracing::debug!(%uuid, "existing file rejected");
                    return Ok(None);
                }
                Ok(Some(record.uuid))
            }
            SubmittedFile::New(source) => {
                if (self.on_upload)(&source) == Decision::Reject {
                    tracing::debug!(original = %source.original_name(), "upload rejected");
                    return Ok(None);
                }
                let record = self
                    .service
                    .store(StoreRequest::new(source, self.storage_path.clone()))
                    .await?;
                Ok(Some(record.uuid))
            }
        }
    }

    /// Deletes a file no longer referenced by the attribute
    async fn delete_replaced_file(&self, uuid: &str) -> Result<()> {
        self.service.delete(uuid).await?;
        tracing::debug!(%uuid, "deleted replaced file");
        Ok(())
    }
}

/// Parses a JSON-encoded list of identifiers as stored by
/// [`AttributeMutator::mutate_array`]
///
/// `None` and blank input decode to an empty list.
///
/// # Errors
///
/// Returns `Serialization` if the input is not a JSON array of strings
pub fn decode_uuid_list(encoded: Option<&str>) -> Result<Vec<String>> {
    match encoded.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(json) => Ok(serde_json::from_str(json)?),
    }
}
