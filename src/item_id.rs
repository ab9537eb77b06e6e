//! Namespaced item identifiers.
//!
//! Every stored item is keyed by `"{source_type}:{source_item_id}"`, e.g.
//! `youtube:abc123`, so ids from different sources never collide.

use crate::error::ValidationError;

pub const SOURCE_TYPE_YOUTUBE: &str = "youtube";
pub const SOURCE_TYPE_RSS: &str = "rss";
pub const SOURCE_TYPE_BILIBILI: &str = "bilibili";

/// Join a source type and the source's own id into a store key.
///
/// The source item id may itself contain `:` (RSS guids are often URLs);
/// [`parse_item_id`] only splits on the first one.
pub fn build_item_id(source_type: &str, source_item_id: &str) -> Result<String, ValidationError> {
    if source_type.is_empty() {
        return Err(ValidationError::Empty("source_type"));
    }
    if source_item_id.is_empty() {
        return Err(ValidationError::Empty("source_item_id"));
    }
    if source_type.contains(':') {
        return Err(ValidationError::ColonInSourceType(source_type.to_string()));
    }
    Ok(format!("{source_type}:{source_item_id}"))
}

/// Split a namespaced id back into `(source_type, source_item_id)`.
pub fn parse_item_id(item_id: &str) -> Result<(&str, &str), ValidationError> {
    match item_id.split_once(':') {
        Some((source_type, source_item_id))
            if !source_type.is_empty() && !source_item_id.is_empty() =>
        {
            Ok((source_type, source_item_id))
        }
        _ => Err(ValidationError::MalformedItemId(item_id.to_string())),
    }
}
