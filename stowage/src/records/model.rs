//! Stored file record, filters and patches

use crate::storage::{blob_path, split_extension};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the sub-directory holding thumbnails next to their originals
pub const THUMBNAIL_DIR: &str = "thumbs";

/// Metadata describing a managed file
///
/// The blob lives at `path/name`; a thumbnail, if one was derived, lives at
/// `path/thumbs/name`. The numeric `id` is internal and never serialized,
/// `uuid` is the handle handed out to hosts.
///
/// # Examples
///
/// ```rust
/// use stowage::records::StoredFileRecord;
///
/// let record = StoredFileRecord::new(1, "550e8400-e29b-41d4-a716-446655440000", "q3-report.pdf", "reports/2024", None);
///
/// assert_eq!(record.pathname(), "reports/2024/q3-report.pdf");
/// assert_eq!(record.thumbnail_pathname(), "reports/2024/thumbs/q3-report.pdf");
/// assert_eq!(record.display_title(), "q3-report");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredFileRecord {
    /// Internal row identity, assigned by the record store
    #[serde(skip)]
    pub id: i64,

    /// Externally visible identifier (hyphenated UUID)
    pub uuid: String,

    /// Sanitized, collision-free blob name including extension
    pub name: String,

    /// Logical directory the blob lives under
    pub path: String,

    /// Display label, `None` renders as the base name
    pub title: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl StoredFileRecord {
    /// Creates a record stamped with the current time
    #[must_use]
    pub fn new(
        id: i64,
        uuid: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
        title: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            uuid: uuid.into(),
            name: name.into(),
            path: path.into(),
            title: normalize_title(title),
            created_at: now,
            updated_at: now,
        }
    }

    /// Logical path of the blob
    #[must_use]
    pub fn pathname(&self) -> String {
        blob_path(&self.path, &self.name)
    }

    /// Logical path a thumbnail of this file would live at
    #[must_use]
    pub fn thumbnail_pathname(&self) -> String {
        blob_path(&blob_path(&self.path, THUMBNAIL_DIR), &self.name)
    }

    /// Extension of the stored name, if any
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        split_extension(&self.name).1
    }

    /// Stored name without its extension
    #[must_use]
    pub fn basename(&self) -> &str {
        split_extension(&self.name).0
    }

    /// Title to show, falling back to the base name
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or_else(|| self.basename())
    }
}

impl fmt::Display for StoredFileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoredFile(uuid={}, path={})", self.uuid, self.pathname())
    }
}

/// Payload for inserting a new record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStoredFile {
    /// Identifier to persist
    pub uuid: String,
    /// Resolved blob name
    pub name: String,
    /// Logical directory
    pub path: String,
    /// Display label
    pub title: Option<String>,
}

/// Exact-match conjunction over record fields
///
/// An empty filter matches every record.
///
/// # Examples
///
/// ```rust
/// use stowage::records::RecordFilter;
///
/// let filter = RecordFilter::new().path("reports/2024").name("q3-report.pdf");
/// assert!(!filter.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFilter {
    /// Match on identifier
    pub uuid: Option<String>,
    /// Match on stored name
    pub name: Option<String>,
    /// Match on logical directory
    pub path: Option<String>,
    /// Match on title
    pub title: Option<String>,
}

impl RecordFilter {
    /// Creates an empty filter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to an identifier
    #[must_use]
    pub fn uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Restricts to a stored name
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restricts to a logical directory
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Restricts to a title
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Returns `true` if no field is constrained
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.uuid.is_none() && self.name.is_none() && self.path.is_none() && self.title.is_none()
    }

    /// Constrained `(column, value)` pairs in a fixed order
    #[must_use]
    pub fn conditions(&self) -> Vec<(&'static str, &str)> {
        [
            ("uuid", self.uuid.as_deref()),
            ("name", self.name.as_deref()),
            ("path", self.path.as_deref()),
            ("title", self.title.as_deref()),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
        .collect()
    }

    /// Checks a record against the filter
    #[must_use]
    pub fn matches(&self, record: &StoredFileRecord) -> bool {
        self.conditions().into_iter().all(|(column, value)| match column {
            "uuid" => record.uuid == value,
            "name" => record.name == value,
            "path" => record.path == value,
            _ => record.title.as_deref() == Some(value),
        })
    }
}

/// Partial attribute update for a record
///
/// `title: None` leaves the title untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPatch {
    /// New title
    #[serde(with = "double_option")]
    pub title: Option<Option<String>>,
}

impl RecordPatch {
    /// Creates an empty patch
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title; blank titles clear it
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(normalize_title(Some(title.into())));
        self
    }

    /// Clears the title so the base name is shown
    #[must_use]
    pub fn clear_title(mut self) -> Self {
        self.title = Some(None);
        self
    }

    /// Returns `true` if the patch changes nothing
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
    }

    /// Applies the patch to a record in place
    pub fn apply(&self, record: &mut StoredFileRecord) {
        if let Some(title) = &self.title {
            record.title = normalize_title(title.clone());
        }
    }
}

/// Maps blank titles to `None`
pub(crate) fn normalize_title(title: Option<String>) -> Option<String> {
    title.filter(|t| !t.trim().is_empty())
}

/// Serde support for `Option<Option<T>>` where a present `null` clears
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, path: &str, title: Option<&str>) -> StoredFileRecord {
        StoredFileRecord::new(7, "uuid-7", name, path, title.map(String::from))
    }

    #[test]
    fn test_pathnames() {
        let r = record("photo.png", "a/b", None);
        assert_eq!(r.pathname(), "a/b/photo.png");
        assert_eq!(r.thumbnail_pathname(), "a/b/thumbs/photo.png");
    }

    #[test]
    fn test_display_title_falls_back_to_basename() {
        assert_eq!(record("test-file.pdf", "a", None).display_title(), "test-file");
        assert_eq!(record("test-file.pdf", "a", Some("Q3")).display_title(), "Q3");
        assert_eq!(record("test-file.pdf", "a", Some("  ")).display_title(), "test-file");
    }

    #[test]
    fn test_id_is_not_serialized() {
        let json = serde_json::to_value(record("a.txt", "p", None)).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["uuid"], "uuid-7");
    }

    #[test]
    fn test_filter_matches() {
        let r = record("a.txt", "docs", Some("Alpha"));

        assert!(RecordFilter::new().matches(&r));
        assert!(RecordFilter::new().path("docs").name("a.txt").matches(&r));
        assert!(RecordFilter::new().title("Alpha").matches(&r));
        assert!(!RecordFilter::new().path("docs").name("b.txt").matches(&r));
        assert!(!RecordFilter::new().title("Beta").matches(&r));
    }

    #[test]
    fn test_filter_conditions_order() {
        let filter = RecordFilter::new().title("t").path("p");
        assert_eq!(filter.conditions(), vec![("path", "p"), ("title", "t")]);
    }

    #[test]
    fn test_patch_apply() {
        let mut r = record("a.txt", "docs", Some("Alpha"));

        RecordPatch::new().apply(&mut r);
        assert_eq!(r.title.as_deref(), Some("Alpha"));

        RecordPatch::new().title("Beta").apply(&mut r);
        assert_eq!(r.title.as_deref(), Some("Beta"));

        RecordPatch::new().title("").apply(&mut r);
        assert_eq!(r.title, None);
    }

    #[test]
    fn test_patch_deserialize() {
        let patch: RecordPatch = serde_json::from_str(r#"{"title": "New"}"#).unwrap();
        assert_eq!(patch.title, Some(Some("New".to_string())));

        let patch: RecordPatch = serde_json::from_str(r#"{"title": null}"#).unwrap();
        assert_eq!(patch.title, Some(None));

        let patch: RecordPatch = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());
    }
}
