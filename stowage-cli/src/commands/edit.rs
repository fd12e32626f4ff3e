//! Changing stored files

use anyhow::Result;
use stowage::records::RecordPatch;
use stowage::service::FileStorageService;

/// Sets the title of a file, clearing it for `None`
///
/// # Errors
///
/// Returns an error if no file has the identifier or the update fails
pub async fn set_title(service: &FileStorageService, uuid: &str, title: Option<&str>) -> Result<()> {
    let patch = match title {
        Some(title) => RecordPatch::new().title(title),
        None => RecordPatch::new().clear_title(),
    };
    service.update(uuid, &patch).await?;
    Ok(())
}
