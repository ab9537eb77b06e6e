//! The core data type shared by the store, the recommenders, and the report.
//!
//! `Item` represents one trackable piece of content (currently a YouTube
//! video or an RSS post).  Feed sources hand over [`RawEntry`] values; the
//! conversion into `Item` is where identifiers are namespaced and timestamps
//! are validated and normalised to UTC, so nothing downstream has to
//! re-check them.
//!
//! ## Sorting
//!
//! `Item` implements [`Ord`] in the store's canonical order: newest
//! `published` first, ties broken by `item_id` ascending.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ValidationError;
use crate::item_id::build_item_id;

/// A single tracked entry.
///
/// Values are immutable: changing the read state produces a new `Item`
/// through [`Item::with_seen`], and the store replaces the old value by id.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Item {
    item_id: String,
    source_type: String,
    source_url: String,
    title: String,
    link: String,
    #[serde(serialize_with = "serialize_published")]
    published: DateTime<Utc>,
    seen: bool,
}

/// One entry as produced by a feed source, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// The source's own id (YouTube video id, RSS guid, ...).
    pub source_item_id: String,
    pub source_type: String,
    /// Feed or channel URL the entry was fetched from.
    pub source_url: String,
    pub title: String,
    pub link: String,
    /// Timestamp text exactly as the feed supplied it.
    pub published: String,
}

impl Item {
    /// Build an item, normalising `published` to UTC.
    pub fn new<Tz: TimeZone>(
        item_id: impl Into<String>,
        source_type: impl Into<String>,
        source_url: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
        published: DateTime<Tz>,
        seen: bool,
    ) -> Result<Self, ValidationError> {
        let source_type = source_type.into();
        if source_type.is_empty() {
            return Err(ValidationError::Empty("source_type"));
        }

        Ok(Self {
            item_id: item_id.into(),
            source_type,
            source_url: source_url.into(),
            title: title.into(),
            link: link.into(),
            published: published.with_timezone(&Utc),
            seen,
        })
    }

    /// Convert a fetched feed entry into an unseen item.
    pub fn from_raw(entry: RawEntry) -> Result<Self, ValidationError> {
        let item_id = build_item_id(&entry.source_type, &entry.source_item_id)?;
        let published = parse_published(&entry.published)?;
        Self::new(
            item_id,
            entry.source_type,
            entry.source_url,
            entry.title,
            entry.link,
            published,
            false,
        )
    }

    /// A copy of this item with the read flag replaced.
    pub fn with_seen(&self, seen: bool) -> Self {
        Self {
            seen,
            ..self.clone()
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn source_type(&self) -> &str {
        &self.source_type
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn published(&self) -> DateTime<Utc> {
        self.published
    }

    pub fn seen(&self) -> bool {
        self.seen
    }
}

// ---------------------------------------------------------------------------
// Ordering: newest first, then item_id ascending
// ---------------------------------------------------------------------------

impl Ord for Item {
    fn cmp(&self, other: &Self) -> Ordering {
        // `other` first on `published` for newest-first.  The trailing
        // fields only keep `Ord` consistent with `Eq`; distinct ids never
        // reach them.
        other
            .published
            .cmp(&self.published)
            .then_with(|| self.item_id.cmp(&other.item_id))
            .then_with(|| self.source_type.cmp(&other.source_type))
            .then_with(|| self.source_url.cmp(&other.source_url))
            .then_with(|| self.title.cmp(&other.title))
            .then_with(|| self.link.cmp(&other.link))
            .then_with(|| self.seen.cmp(&other.seen))
    }
}

impl PartialOrd for Item {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Serialized form
// ---------------------------------------------------------------------------

/// The persisted shape of an item, before timestamp validation.
#[derive(Debug, Deserialize)]
pub(crate) struct ItemRecord {
    pub item_id: String,
    pub source_type: String,
    pub source_url: String,
    pub title: String,
    pub link: String,
    pub published: String,
    #[serde(default)]
    pub seen: bool,
}

impl TryFrom<ItemRecord> for Item {
    type Error = ValidationError;

    fn try_from(record: ItemRecord) -> Result<Self, Self::Error> {
        let published = parse_published(&record.published)?;
        Item::new(
            record.item_id,
            record.source_type,
            record.source_url,
            record.title,
            record.link,
            published,
            record.seen,
        )
    }
}

impl<'de> Deserialize<'de> for Item {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let record = ItemRecord::deserialize(deserializer)?;
        Item::try_from(record).map_err(serde::de::Error::custom)
    }
}

/// Render a UTC instant as ISO-8601 with a `Z` suffix, keeping any
/// sub-second precision.
pub fn format_published(published: &DateTime<Utc>) -> String {
    published.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn serialize_published<S>(published: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_published(published))
}

/// Parse a feed or store timestamp into UTC.
///
/// Accepts RFC 3339 (Atom, the store) and RFC 2822 (RSS `pubDate`).  Text
/// without an offset is rejected rather than guessed.
pub fn parse_published(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = value.trim();

    let rfc3339_err = match DateTime::parse_from_rfc3339(trimmed) {
        Ok(dt) => return Ok(dt.with_timezone(&Utc)),
        Err(e) => e,
    };

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    if NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").is_ok() {
        return Err(ValidationError::NaiveTimestamp(value.to_string()));
    }

    Err(ValidationError::InvalidTimestamp {
        value: value.to_string(),
        source: rfc3339_err,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
