//! Thumbnail derivation for image uploads

use crate::error::Result;
use crate::records::THUMBNAIL_DIR;
use crate::storage::{blob_path, split_extension, ImageResizer};
use serde::{Deserialize, Serialize};

/// Default thumbnail width bound in pixels
pub const DEFAULT_MAX_WIDTH: u32 = 300;

/// Thumbnail settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Largest thumbnail width; narrower images keep their size
    pub max_width: u32,

    /// Lower-case extensions eligible for a thumbnail
    pub extensions: Vec<String>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            extensions: ["jpg", "jpeg", "png", "gif"].map(String::from).to_vec(),
        }
    }
}

/// Decides thumbnail eligibility and produces scaled-down copies
///
/// Eligibility is judged from the extension alone. Bytes that do not decode
/// as an image despite an eligible extension are an `InvalidSource` error.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailDeriver {
    config: ThumbnailConfig,
}

impl ThumbnailDeriver {
    /// Creates a deriver from configuration
    #[must_use]
    pub const fn new(config: ThumbnailConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    /// Returns `true` if a file with this name gets a thumbnail
    #[must_use]
    pub fn is_eligible(&self, name: &str) -> bool {
        split_extension(name).1.is_some_and(|ext| {
            self.config
                .extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
    }

    /// Like [`Self::is_eligible`], falling back to the MIME type when the
    /// name has no extension
    #[must_use]
    pub fn is_eligible_upload(&self, name: &str, content_type: &str) -> bool {
        if split_extension(name).1.is_some() {
            return self.is_eligible(name);
        }
        mime_guess::get_mime_extensions_str(content_type).is_some_and(|exts| {
            exts.iter().any(|ext| {
                self.config
                    .extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
        })
    }

    /// Scales `bytes` down to the configured width bound
    ///
    /// # Errors
    ///
    /// Returns `InvalidSource` if the bytes are not a decodable image
    pub fn derive(&self, resizer: &dyn ImageResizer, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(resizer.resize(bytes, self.config.max_width)?)
    }

    /// Directory holding thumbnails of files stored under `path`
    #[must_use]
    pub fn thumbnail_dir(&self, path: &str) -> String {
        blob_path(path, THUMBNAIL_DIR)
    }

    /// Logical path of the thumbnail of `path/name`
    ///
    /// Always agrees with [`crate::records::StoredFileRecord::thumbnail_pathname`].
    #[must_use]
    pub fn thumbnail_path(&self, path: &str, name: &str) -> String {
        blob_path(&self.thumbnail_dir(path), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileStorageError;
    use crate::storage::ImageProcessor;
    use crate::testing::create_test_png;

    #[test]
    fn test_eligibility_by_extension() {
        let deriver = ThumbnailDeriver::default();

        for name in ["a.jpg", "a.jpeg", "a.png", "a.gif", "a.PNG"] {
            assert!(deriver.is_eligible(name), "{name}");
        }
        for name in ["a.pdf", "a.webp", "png", "a."] {
            assert!(!deriver.is_eligible(name), "{name}");
        }
    }

    #[test]
    fn test_eligibility_falls_back_to_content_type() {
        let deriver = ThumbnailDeriver::default();

        assert!(deriver.is_eligible_upload("photo", "image/png"));
        assert!(deriver.is_eligible_upload("photo", "image/jpeg"));
        assert!(!deriver.is_eligible_upload("photo", "application/pdf"));
        // An extension always wins over the declared type
        assert!(!deriver.is_eligible_upload("photo.pdf", "image/png"));
    }

    #[test]
    fn test_thumbnail_path() {
        let deriver = ThumbnailDeriver::default();

        assert_eq!(deriver.thumbnail_path("a/b", "photo.png"), "a/b/thumbs/photo.png");
        assert_eq!(deriver.thumbnail_path("", "photo.png"), "thumbs/photo.png");
    }

    #[test]
    fn test_thumbnail_path_matches_record() {
        let deriver = ThumbnailDeriver::new(ThumbnailConfig {
            max_width: 80,
            ..ThumbnailConfig::default()
        });
        let record = crate::records::StoredFileRecord::new(1, "u", "photo.png", "a/b", None);

        assert_eq!(
            deriver.thumbnail_path(&record.path, &record.name),
            record.thumbnail_pathname()
        );
    }

    #[test]
    fn test_derive_bounds_width() {
        let deriver = ThumbnailDeriver::default();
        let processor = ImageProcessor::new();

        let thumb = deriver.derive(&processor, &create_test_png(400, 800)).unwrap();
        assert_eq!(processor.dimensions(&thumb).unwrap(), (300, 600));

        let small = create_test_png(100, 50);
        let thumb = deriver.derive(&processor, &small).unwrap();
        assert_eq!(processor.dimensions(&thumb).unwrap(), (100, 50));
    }

    #[test]
    fn test_derive_custom_width() {
        let deriver = ThumbnailDeriver::new(ThumbnailConfig {
            max_width: 50,
            ..ThumbnailConfig::default()
        });
        let processor = ImageProcessor::new();

        let thumb = deriver.derive(&processor, &create_test_png(200, 100)).unwrap();
        assert_eq!(processor.dimensions(&thumb).unwrap(), (50, 25));
    }

    #[test]
    fn test_derive_rejects_non_image() {
        let deriver = ThumbnailDeriver::default();

        let err = deriver
            .derive(&ImageProcessor::new(), b"definitely not a png")
            .unwrap_err();
        assert!(matches!(err, FileStorageError::InvalidSource(_)));
    }
}
