//! Looking up stored files

use anyhow::Result;
use stowage::records::{RecordFilter, StoredFileRecord};
use stowage::service::FileStorageService;

use crate::output;

/// Builds a filter from the optional search fields
#[must_use]
pub fn filter(
    uuid: Option<&str>,
    name: Option<&str>,
    path: Option<&str>,
    title: Option<&str>,
) -> RecordFilter {
    let mut filter = RecordFilter::new();
    if let Some(uuid) = uuid {
        filter = filter.uuid(uuid);
    }
    if let Some(name) = name {
        filter = filter.name(name);
    }
    if let Some(path) = path {
        filter = filter.path(path);
    }
    if let Some(title) = title {
        filter = filter.title(title);
    }
    filter
}

/// Renders a record together with its blob details
///
/// # Errors
///
/// Returns an error if the blob or its thumbnail cannot be inspected
pub async fn describe(service: &FileStorageService, record: &StoredFileRecord) -> Result<String> {
    let url = service.url(record).await?;
    let size = service.human_size(record).await?.to_string();
    let thumbnail = service.thumbnail_url(record).await?;
    Ok(output::describe(record, &url, &size, thumbnail.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_only_sets_given_fields() {
        let f = filter(None, Some("a.pdf"), Some("docs"), None);
        assert_eq!(f.name.as_deref(), Some("a.pdf"));
        assert_eq!(f.path.as_deref(), Some("docs"));
        assert!(f.uuid.is_none());
        assert!(f.title.is_none());
    }
}
