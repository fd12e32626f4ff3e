//! Terminal rendering of stored file records

use console::style;
use stowage::records::StoredFileRecord;

const RULE_WIDTH: usize = 96;

/// Multi-line description of one record
#[must_use]
pub fn describe(record: &StoredFileRecord, url: &str, size: &str, thumbnail: Option<&str>) -> String {
    let mut lines = vec![
        format!("  UUID:       {}", style(&record.uuid).cyan()),
        format!("  Title:      {}", record.display_title()),
        format!("  Location:   {}", record.pathname()),
        format!("  URL:        {url}"),
        format!("  Size:       {size}"),
    ];
    if let Some(thumb) = thumbnail {
        lines.push(format!("  Thumbnail:  {thumb}"));
    }
    lines.push(format!(
        "  Created:    {}",
        record.created_at.format("%Y-%m-%d %H:%M:%S")
    ));
    lines.push(format!(
        "  Updated:    {}",
        record.updated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    lines.join("\n")
}

/// Fixed-width table of records, one per row
#[must_use]
pub fn table(records: &[StoredFileRecord]) -> String {
    let mut out = vec![
        format!("{:<36}  {:<30}  {:<24}", "UUID", "Location", "Title"),
        "─".repeat(RULE_WIDTH),
    ];
    out.extend(records.iter().map(|record| {
        format!(
            "{:<36}  {:<30}  {:<24}",
            record.uuid,
            record.pathname(),
            record.display_title()
        )
    }));
    out.join("\n")
}
