//! Client filename sanitizing

use crate::storage::split_extension;
use deunicode::deunicode;

/// Default maximum length of a sanitized name, extension included
pub const DEFAULT_MAX_LEN: usize = 60;

/// Longest extension kept as an extension; longer ones join the base name
pub const MAX_EXTENSION_LEN: usize = 16;

/// Lower bound on the configurable length so a base always fits
const MIN_MAX_LEN: usize = 24;

/// Base name used when nothing usable survives sanitizing
const FALLBACK_BASE: &str = "file";

/// Turns arbitrary client filenames into safe storage names
///
/// The output only contains `[a-z0-9-]` in the base name plus an optional
/// `.ext` of lower-case alphanumerics, never starts or ends the base with
/// `-`, and never exceeds the configured length. Sanitizing is idempotent.
///
/// # Examples
///
/// ```rust
/// use stowage::naming::NameSanitizer;
///
/// let sanitizer = NameSanitizer::default();
///
/// assert_eq!(sanitizer.sanitize("Test File.pdf"), "test-file.pdf");
/// assert_eq!(sanitizer.sanitize("Ünïcödé  Résumé.DOCX"), "unicode-resume.docx");
/// assert_eq!(sanitizer.sanitize("???.png"), "file.png");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameSanitizer {
    max_len: usize,
}

impl Default for NameSanitizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEN)
    }
}

impl NameSanitizer {
    /// Creates a sanitizer capping names at `max_len` characters
    ///
    /// Values below 24 are raised to 24 so that a maximal extension still
    /// leaves room for a base name.
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(MIN_MAX_LEN),
        }
    }

    /// Maximum length of produced names
    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.max_len
    }

    /// Sanitizes a full filename, keeping its extension
    #[must_use]
    pub fn sanitize(&self, raw: &str) -> String {
        let ascii = deunicode(raw);
        let (base, extension) = split_extension(&ascii);
        self.sanitize_parts(base, extension)
    }

    /// Sanitizes a base name and attaches `extension`
    ///
    /// Used when the base comes from somewhere other than the file itself,
    /// such as a title chosen by the user. Dots inside `base` are treated as
    /// ordinary separators.
    #[must_use]
    pub fn sanitize_parts(&self, base: &str, extension: Option<&str>) -> String {
        let base = deunicode(base);
        let extension = extension.map(|ext| {
            deunicode(ext)
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .map(|c| c.to_ascii_lowercase())
                .collect::<String>()
        });

        let (base, extension) = match extension {
            Some(ext) if ext.len() > MAX_EXTENSION_LEN => (format!("{base}-{ext}"), None),
            Some(ext) if ext.is_empty() => (base, None),
            other => (base, other),
        };

        let suffix_len = extension.as_ref().map_or(0, |ext| ext.len() + 1);
        let mut slug = slugify(&base);
        slug.truncate(self.max_len - suffix_len);
        let slug = slug.trim_end_matches('-');
        let slug = if slug.is_empty() { FALLBACK_BASE } else { slug };

        match extension {
            Some(ext) => format!("{slug}.{ext}"),
            None => slug.to_string(),
        }
    }
}

/// Lower-cases ASCII alphanumerics and collapses every other run into `-`
fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_basic() {
        let sanitizer = NameSanitizer::default();

        assert_eq!(sanitizer.sanitize("Test File.pdf"), "test-file.pdf");
        assert_eq!(sanitizer.sanitize("photo.PNG"), "photo.png");
        assert_eq!(sanitizer.sanitize("  --Hello__World--  .txt"), "hello-world.txt");
        assert_eq!(sanitizer.sanitize("README"), "readme");
        assert_eq!(sanitizer.sanitize("archive.tar.gz"), "archive-tar.gz");
    }

    #[test]
    fn test_sanitize_transliterates() {
        let sanitizer = NameSanitizer::default();

        assert_eq!(sanitizer.sanitize("Café Crème.jpg"), "cafe-creme.jpg");
        assert_eq!(sanitizer.sanitize("Straße.txt"), "strasse.txt");
    }

    #[test]
    fn test_sanitize_empty_base_falls_back() {
        let sanitizer = NameSanitizer::default();

        assert_eq!(sanitizer.sanitize(""), "file");
        assert_eq!(sanitizer.sanitize("   "), "file");
        assert_eq!(sanitizer.sanitize("!!!.gif"), "file.gif");
        assert_eq!(sanitizer.sanitize(".env"), "env");
    }

    #[test]
    fn test_sanitize_extension_rules() {
        let sanitizer = NameSanitizer::default();

        assert_eq!(sanitizer.sanitize("notes."), "notes");
        assert_eq!(sanitizer.sanitize("notes.t-x-t"), "notes.txt");
        assert_eq!(
            sanitizer.sanitize("data.averyveryverylongextension"),
            "data-averyveryverylongextension"
        );
    }

    #[test]
    fn test_sanitize_truncates_base_only() {
        let sanitizer = NameSanitizer::default();
        let long = format!("{}.jpeg", "a".repeat(100));

        let result = sanitizer.sanitize(&long);
        assert_eq!(result.len(), DEFAULT_MAX_LEN);
        assert!(result.ends_with(".jpeg"));
    }

    #[test]
    fn test_truncation_does_not_leave_trailing_separator() {
        let sanitizer = NameSanitizer::new(24);
        // 20 characters of base budget, the cut lands right after a separator
        let result = sanitizer.sanitize("aaaaaaaaaaaaaaaaaaa bbbbbb.pdf");
        assert_eq!(result, "aaaaaaaaaaaaaaaaaaa.pdf");
    }

    #[test]
    fn test_sanitize_parts_with_title() {
        let sanitizer = NameSanitizer::default();

        assert_eq!(
            sanitizer.sanitize_parts("My Desired File Title", Some("pdf")),
            "my-desired-file-title.pdf"
        );
        assert_eq!(sanitizer.sanitize_parts("Release v1.2", None), "release-v1-2");
    }

    #[test]
    fn test_minimum_length() {
        assert_eq!(NameSanitizer::new(3).max_len(), 24);
        assert_eq!(NameSanitizer::new(100).max_len(), 100);
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(raw in "\\PC{0,120}") {
            let sanitizer = NameSanitizer::default();
            let once = sanitizer.sanitize(&raw);
            prop_assert_eq!(sanitizer.sanitize(&once), once.clone());
        }

        #[test]
        fn sanitize_output_is_safe(raw in "\\PC{0,120}", max_len in 24usize..100) {
            let sanitizer = NameSanitizer::new(max_len);
            let name = sanitizer.sanitize(&raw);

            prop_assert!(!name.is_empty());
            prop_assert!(name.len() <= max_len);
            prop_assert!(name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.'));
            prop_assert!(!name.starts_with('-'));
            prop_assert!(name.matches('.').count() <= 1);
        }
    }
}
