//! Record identifier generation

use crate::records::{RecordError, RecordResult, RecordStore};
use uuid::Uuid;

/// Default number of candidates tried before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Generates random identifiers that are unused in the record store
///
/// A collision of v4 UUIDs is practically impossible, but each candidate is
/// still checked; the record store's unique constraint backs up the window
/// between check and insert.
///
/// # Examples
///
/// ```rust
/// use stowage::identifier::{is_uuid, IdentifierGenerator};
/// use stowage::records::MemoryRecordStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let records = MemoryRecordStore::new();
/// let uuid = IdentifierGenerator::default().generate(&records).await?;
/// assert!(is_uuid(&uuid));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierGenerator {
    max_attempts: u32,
}

impl Default for IdentifierGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl IdentifierGenerator {
    /// Creates a generator trying at most `max_attempts` candidates
    #[must_use]
    pub const fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Returns a hyphenated UUID not yet used by any record
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Exhausted` if every candidate was taken, or the
    /// store's error if the existence check fails
    pub async fn generate(&self, records: &dyn RecordStore) -> RecordResult<String> {
        for _ in 0..self.max_attempts {
            let candidate = Uuid::new_v4().hyphenated().to_string();
            if !records.exists_by_uuid(&candidate).await? {
                return Ok(candidate);
            }
            tracing::warn!(uuid = %candidate, "identifier collision, regenerating");
        }
        Err(RecordError::Exhausted(self.max_attempts))
    }
}

/// Checks that `value` is a UUID in canonical hyphenated form
#[must_use]
pub fn is_uuid(value: &str) -> bool {
    value.len() == 36 && Uuid::try_parse(value).is_ok()
}
