//! RSS 2.0 feed source.

use anyhow::{Context, Result};

use super::{fetch_text, DataSource};
use crate::item::RawEntry;
use crate::item_id::SOURCE_TYPE_RSS;

/// An RSS feed data source.
///
/// Fetches and parses an RSS 2.0 feed over HTTP using the [`rss`] crate.
pub struct RssSource {
    /// The feed URL to poll.
    pub url: String,
    /// A human-readable label used in logs.
    pub label: String,
}

impl RssSource {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }

    /// Parse an already-fetched [`rss::Channel`] into [`RawEntry`]s.
    ///
    /// Items with neither `<guid>` nor `<link>`, or without `<pubDate>`, are
    /// skipped.  The date text is passed through untouched; validating it is
    /// up to [`Item::from_raw`](crate::item::Item::from_raw).
    pub fn parse_channel(channel: &rss::Channel, source_url: &str) -> Vec<RawEntry> {
        channel
            .items()
            .iter()
            .filter_map(|item| {
                // Prefer <guid>, fall back to <link>.
                let id = item
                    .guid()
                    .map(|g| g.value().trim())
                    .or_else(|| item.link().map(str::trim))
                    .filter(|id| !id.is_empty());
                let published = item.pub_date().map(str::trim).filter(|d| !d.is_empty());

                let (Some(id), Some(published)) = (id, published) else {
                    tracing::debug!(title = ?item.title(), "skipping rss item without id or date");
                    return None;
                };

                Some(RawEntry {
                    source_item_id: id.to_string(),
                    source_type: SOURCE_TYPE_RSS.to_string(),
                    source_url: source_url.to_string(),
                    title: item.title().unwrap_or("(untitled)").to_string(),
                    link: item.link().unwrap_or(id).to_string(),
                    published: published.to_string(),
                })
            })
            .collect()
    }
}

impl DataSource for RssSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn fetch(&self) -> Result<Vec<RawEntry>> {
        let body = fetch_text(&self.url)?;
        let channel = rss::Channel::read_from(body.as_bytes())
            .with_context(|| format!("invalid RSS from {}", self.url))?;
        Ok(Self::parse_channel(&channel, &self.url))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
