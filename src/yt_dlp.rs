//! Conversion of yt-dlp `videos.jsonl` dumps into store items.
//!
//! Each non-blank line is one JSON object as written by
//! `yt-dlp --dump-json`.  Only the fields below are read; everything else
//! yt-dlp emits is ignored.

use anyhow::{anyhow, Result};
use chrono::DateTime;
use serde::Deserialize;

use crate::item::Item;
use crate::item_id::{build_item_id, SOURCE_TYPE_YOUTUBE};

#[derive(Debug, Deserialize)]
struct VideoRecord {
    id: String,
    channel_url: String,
    title: String,
    original_url: String,
    /// Upload time as Unix seconds.
    timestamp: i64,
}

impl VideoRecord {
    fn into_item(self) -> Result<Item> {
        let published = DateTime::from_timestamp(self.timestamp, 0)
            .ok_or_else(|| anyhow!("timestamp {} is out of range", self.timestamp))?;
        let item = Item::new(
            build_item_id(SOURCE_TYPE_YOUTUBE, &self.id)?,
            SOURCE_TYPE_YOUTUBE,
            self.channel_url,
            self.title,
            self.original_url,
            published,
            false,
        )?;
        Ok(item)
    }
}

/// Convert one `videos.jsonl` line.
pub fn parse_line(line: &str) -> Result<Item> {
    let record: VideoRecord = serde_json::from_str(line)?;
    record.into_item()
}

/// Convert every line of a `videos.jsonl` document, in file order.
///
/// Blank lines are ignored.  A line that is not valid JSON, lacks one of
/// the required fields, or carries an unusable value is logged and skipped.
pub fn parse_videos_jsonl(text: &str) -> Vec<Item> {
    let mut items = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(item) => items.push(item),
            Err(e) => tracing::warn!(line = index + 1, "skipping malformed yt-dlp record: {e:#}"),
        }
    }
    items
}
