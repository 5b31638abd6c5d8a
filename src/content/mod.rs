/// Site content records
///
/// Text blocks and curriculum pages are keyed by a natural identifier and
/// written with upsert semantics. Annual events are plain CRUD records.
pub mod blocks;
pub mod curriculum;
pub mod events;

pub use blocks::{ContentBlock, ContentBlockInput, ContentManager};
pub use curriculum::{CurriculumLevel, CurriculumLevelInput, CurriculumManager, Stream};
pub use events::{AnnualEvent, EventCategory, EventFilter, EventManager, EventUpdate, NewEvent};

use crate::error::{CmsError, CmsResult};

/// Normalise a natural key taken from the request path
pub(crate) fn normalize_key(raw: &str, field: &str) -> CmsResult<String> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(CmsError::Validation(format!("{} is required", field)));
    }
    if key.len() > 100 {
        return Err(CmsError::Validation(format!(
            "{} must be at most 100 characters",
            field
        )));
    }
    Ok(key.to_string())
}

/// Reject absent or blank required text
pub(crate) fn required_text(value: Option<String>, field: &str) -> CmsResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CmsError::Validation(format!("{} is required", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  about ", "key").unwrap(), "about");
        assert!(normalize_key("   ", "key").is_err());
        assert!(normalize_key(&"k".repeat(101), "key").is_err());
    }
}
