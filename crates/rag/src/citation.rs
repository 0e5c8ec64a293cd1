//! Citation labels and Vietnamese date localization.
//!
//! Pure functions over corpus metadata. Date parsing failures are recovered
//! locally by returning the input unchanged; nothing in this module errors.

use crate::types::{DocMetadata, SourceRecord};
use chrono::{Datelike, NaiveDate};

/// Fallback label for records without an original recipe name.
pub const UNKNOWN_RECIPE: &str = "Unknown Recipe";

/// Fallback label for metadata without a stored citation label.
pub const UNKNOWN_SOURCE: &str = "Unknown Source";

/// Input date formats tried in order: full month name, then abbreviated.
const DATE_FORMATS: [&str; 2] = ["%B %d, %Y", "%b %d, %Y"];

/// Derive the citation label for a source record.
///
/// `"{original_recipe} ({newspaper}, {date})"`, or the fixed fallback when
/// the record carries no recipe name.
pub fn citation_label(record: &SourceRecord) -> String {
    if record.original_recipe.is_empty() {
        UNKNOWN_RECIPE.to_string()
    } else {
        format!(
            "{} ({}, {})",
            record.original_recipe, record.newspaper, record.date
        )
    }
}

/// Resolve the label to display for a chunk's metadata.
pub fn display_label(metadata: &DocMetadata) -> String {
    if !metadata.citation_label.is_empty() {
        metadata.citation_label.clone()
    } else if !metadata.original_recipe.is_empty() {
        metadata.original_recipe.clone()
    } else {
        UNKNOWN_SOURCE.to_string()
    }
}

/// Rewrite every occurrence of `date` inside `text` into the localized
/// `"{day} tháng {month}, {year}"` form.
///
/// When `date` is empty or does not match a known format, `text` is returned
/// unchanged. Idempotent: once rewritten, the original date string no longer
/// occurs in the text.
pub fn localize_date(text: &str, date: &str) -> String {
    if date.is_empty() {
        return text.to_string();
    }

    let parsed = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok());

    match parsed {
        Some(dt) => {
            let localized = format!("{} tháng {}, {}", dt.day(), dt.month(), dt.year());
            text.replace(date, &localized)
        }
        None => text.to_string(),
    }
}
