//! Core types for blob storage

use std::fmt;
use thiserror::Error;

/// Errors that can occur during blob storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// Blob not found in storage
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// I/O error during storage operation
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid logical path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Generic storage error
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A file that has been uploaded but not yet stored
///
/// This represents the in-memory state of an upload before it's persisted
/// to the blob backend. `filename` is the name declared by the client and is
/// never used verbatim as a storage name.
///
/// # Examples
///
/// ```rust
/// use stowage::storage::UploadedFile;
///
/// let file = UploadedFile {
///     filename: "Annual Report.pdf".to_string(),
///     content_type: "application/pdf".to_string(),
///     data: vec![0x25, 0x50, 0x44, 0x46], // PDF magic bytes
/// };
///
/// assert_eq!(file.size(), 4);
/// assert_eq!(file.basename(), "Annual Report");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Original filename from the upload
    pub filename: String,

    /// MIME content type declared by the client (e.g., "image/png")
    pub content_type: String,

    /// File data as bytes
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Creates a new uploaded file
    ///
    /// # Examples
    ///
    /// ```rust
    /// use stowage::storage::UploadedFile;
    ///
    /// let file = UploadedFile::new(
    ///     "photo.jpg",
    ///     "image/jpeg",
    ///     vec![0xFF, 0xD8, 0xFF], // JPEG magic bytes
    /// );
    /// ```
    #[must_use]
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Returns the size of the file in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Extracts the file extension from the filename
    ///
    /// Returns `None` if the filename has no extension
    ///
    /// # Examples
    ///
    /// ```rust
    /// use stowage::storage::UploadedFile;
    ///
    /// let file = UploadedFile::new("document.pdf", "application/pdf", vec![]);
    /// assert_eq!(file.extension(), Some("pdf"));
    ///
    /// let no_ext = UploadedFile::new("README", "text/plain", vec![]);
    /// assert_eq!(no_ext.extension(), None);
    /// ```
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        split_extension(&self.filename).1
    }

    /// Returns the filename without its extension
    #[must_use]
    pub fn basename(&self) -> &str {
        split_extension(&self.filename).0
    }
}

/// Splits a file name into base name and extension
///
/// The extension is whatever follows the last `.`; a leading dot (as in
/// `.env`) does not start an extension.
///
/// # Examples
///
/// ```rust
/// use stowage::storage::split_extension;
///
/// assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", Some("gz")));
/// assert_eq!(split_extension("README"), ("README", None));
/// assert_eq!(split_extension(".env"), (".env", None));
/// ```
#[must_use]
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(pos) => (&name[..pos], Some(&name[pos + 1..])),
    }
}

/// Joins a logical directory and a blob name into a logical blob path
///
/// Surrounding slashes on `dir` are ignored, an empty `dir` yields `name`.
///
/// # Examples
///
/// ```rust
/// use stowage::storage::blob_path;
///
/// assert_eq!(blob_path("a/b", "file.pdf"), "a/b/file.pdf");
/// assert_eq!(blob_path("a/b/", "file.pdf"), "a/b/file.pdf");
/// assert_eq!(blob_path("", "file.pdf"), "file.pdf");
/// ```
#[must_use]
pub fn blob_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Returns the last segment of a logical blob path
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Byte count rendered with binary units, as shown to end users
///
/// # Examples
///
/// ```rust
/// use stowage::storage::HumanSize;
///
/// assert_eq!(HumanSize(512).to_string(), "512 B");
/// assert_eq!(HumanSize(1536).to_string(), "1.5 KB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanSize(pub u64);

impl fmt::Display for HumanSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

        #[allow(clippy::cast_precision_loss)]
        let mut value = self.0 as f64;
        let mut unit = 0;
        while value > 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }

        // Two decimals at most, without trailing zeros
        let rounded = (value * 100.0).round() / 100.0;
        write!(f, "{rounded} {}", UNITS[unit])
    }
}
