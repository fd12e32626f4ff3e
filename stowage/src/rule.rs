//! Validation of submitted file-reference values
//!
//! Runs before [`crate::mutator::AttributeMutator`] so that hosts can report
//! problems back to the user instead of failing mid-save.
//!
//! Upload types are checked against the content's magic number (via `infer`),
//! not only against the client's declared `Content-Type`. When the content
//! has no recognizable signature the declared type is used.

use crate::error::Result;
use crate::mutator::SubmittedFile;
use crate::service::{FileSource, FileStorageService};
use crate::storage::{HumanSize, UploadedFile};
use std::fmt;

/// A failed validation check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    /// Human-readable message
    pub message: String,
}

impl RuleViolation {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Checks a submitted value for a stored-file attribute
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use stowage::mutator::SubmittedFile;
/// use stowage::records::MemoryRecordStore;
/// use stowage::rule::StoredFileRule;
/// use stowage::service::FileStorageService;
/// use stowage::storage::{MemoryBlobStorage, UploadedFile};
///
/// # async fn example() -> anyhow::Result<()> {
/// let service = FileStorageService::new(
///     Arc::new(MemoryBlobStorage::new()),
///     Arc::new(MemoryRecordStore::new()),
/// );
/// let rule = StoredFileRule::new()
///     .max_size(1024 * 1024)
///     .allowed_types(["image/*", "application/pdf"]);
///
/// let upload = SubmittedFile::upload(UploadedFile::new("notes.txt", "text/plain", b"hi".to_vec()));
/// let violations = rule.validate(&service, &upload).await?;
/// assert_eq!(violations.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredFileRule {
    max_size: Option<u64>,
    allowed_types: Vec<String>,
}

impl StoredFileRule {
    /// Creates a rule accepting any existing reference and any upload
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits upload size in bytes
    #[must_use]
    pub const fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = Some(bytes);
        self
    }

    /// Limits upload MIME types; `type/*` matches a whole family
    #[must_use]
    pub fn allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Returns every violation of the value; empty means valid
    ///
    /// # Errors
    ///
    /// Returns an error if a backend lookup fails
    pub async fn validate(
        &self,
        service: &FileStorageService,
        value: &SubmittedFile,
    ) -> Result<Vec<RuleViolation>> {
        match value {
            SubmittedFile::Existing { uuid } => {
                if service.record_store().exists_by_uuid(uuid).await? {
                    Ok(Vec::new())
                } else {
                    Ok(vec![RuleViolation::new(format!(
                        "The selected file {uuid} does not exist"
                    ))])
                }
            }
            SubmittedFile::New(FileSource::Upload(file)) => Ok(self.check_upload(file)),
            SubmittedFile::New(FileSource::ExistingBlob { path }) => {
                let blobs = service.blob_storage();
                if !blobs.exists(path).await? {
                    return Ok(vec![RuleViolation::new(format!(
                        "The file {path} does not exist"
                    ))]);
                }
                let size = blobs.size(path).await?;
                let mime = blobs.mime_type(path).await?;
                Ok(self.check(size, &mime))
            }
        }
    }

    fn check_upload(&self, file: &UploadedFile) -> Vec<RuleViolation> {
        let mime = detect_mime(file);
        self.check(file.size(), mime)
    }

    fn check(&self, size: u64, mime: &str) -> Vec<RuleViolation> {
        let mut violations = Vec::new();

        if let Some(max) = self.max_size {
            if size > max {
                violations.push(RuleViolation::new(format!(
                    "The file may not be larger than {} (got {})",
                    HumanSize(max),
                    HumanSize(size)
                )));
            }
        }

        if !self.allowed_types.is_empty() && !self.allowed_types.iter().any(|t| mime_matches(t, mime)) {
            violations.push(RuleViolation::new(format!(
                "The file must be of type {} (got {mime})",
                self.allowed_types.join(", ")
            )));
        }

        violations
    }
}

/// Detected MIME type of an upload, falling back to the declared one
fn detect_mime(file: &UploadedFile) -> &str {
    infer::get(&file.data).map_or(file.content_type.as_str(), |kind| kind.mime_type())
}

fn mime_matches(pattern: &str, mime: &str) -> bool {
    pattern.strip_suffix("/*").map_or_else(
        || pattern.eq_ignore_ascii_case(mime),
        |family| {
            mime.split_once('/')
                .is_some_and(|(prefix, _)| prefix.eq_ignore_ascii_case(family))
        },
    )
}
