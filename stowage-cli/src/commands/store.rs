//! Storing local files

use anyhow::{Context, Result};
use std::path::Path;
use stowage::records::StoredFileRecord;
use stowage::service::{FileStorageService, StoreRequest};
use stowage::storage::UploadedFile;

/// Reads `file` from disk and stores it under `path`
///
/// The content type is guessed from the file extension; the service still
/// verifies image content before deriving a thumbnail.
///
/// # Errors
///
/// Returns an error if the file cannot be read or storing it fails
pub async fn store_file(
    service: &FileStorageService,
    file: &Path,
    path: &str,
    title: Option<&str>,
    thumbnail: bool,
) -> Result<StoredFileRecord> {
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", file.display()))?;
    let content_type = mime_guess::from_path(file).first_or_octet_stream();

    let mut request = StoreRequest::new(
        UploadedFile::new(filename, content_type.essence_str(), data),
        path,
    )
    .derive_thumbnail(thumbnail);
    if let Some(title) = title {
        request = request.title(title);
    }

    Ok(service.store(request).await?)
}
