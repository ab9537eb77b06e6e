//! YouTube channel feeds.
//!
//! Every public channel has an Atom feed at
//! `https://www.youtube.com/feeds/videos.xml?channel_id=<id>`.  Only
//! `/channel/<id>` URLs carry the id directly; handle (`/@name`), `/c/` and
//! `/user/` URLs would need a page scrape and are rejected.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use atom_syndication::{Entry, Feed};
use reqwest::Url;

use super::{fetch_text, DataSource};
use crate::item::RawEntry;
use crate::item_id::SOURCE_TYPE_YOUTUBE;

const FEED_ENDPOINT: &str = "https://www.youtube.com/feeds/videos.xml";

/// Pull the channel id out of a `http(s)://(www.)youtube.com/channel/<id>`
/// URL.  Anything else yields `None`.
pub fn extract_channel_id(url: &str) -> Option<String> {
    let url = Url::parse(url.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    if !matches!(url.host_str()?, "youtube.com" | "www.youtube.com") {
        return None;
    }

    let mut segments = url.path_segments()?;
    if segments.next()? != "channel" {
        return None;
    }
    let id = segments.next()?;
    (!id.is_empty()).then(|| id.to_string())
}

/// The Atom feed URL for a channel id.
pub fn build_feed_url(channel_id: &str) -> Result<String> {
    let channel_id = channel_id.trim();
    if channel_id.is_empty() {
        bail!("channel_id cannot be empty");
    }
    let url = Url::parse_with_params(FEED_ENDPOINT, [("channel_id", channel_id)])?;
    Ok(url.into())
}

/// A YouTube channel, fetched through its Atom feed.
pub struct YoutubeSource {
    /// The channel URL as configured; stored items point back to it.
    pub channel_url: String,
    pub channel_id: String,
    pub label: String,
}

impl YoutubeSource {
    pub fn from_channel_url(channel_url: &str, label: impl Into<String>) -> Result<Self> {
        let channel_id = extract_channel_id(channel_url)
            .ok_or_else(|| anyhow!("not a YouTube /channel/ URL: {channel_url}"))?;
        Ok(Self {
            channel_url: channel_url.trim().to_string(),
            channel_id,
            label: label.into(),
        })
    }

    /// Parse a channel feed document.
    ///
    /// Blank input is an empty feed.  Entries without a video id, title, or
    /// link are skipped; `published` falls back to `updated`.
    pub fn parse_feed(xml: &str, source_url: &str) -> Result<Vec<RawEntry>> {
        if xml.trim().is_empty() {
            return Ok(Vec::new());
        }

        let feed = Feed::from_str(xml).context("Failed to parse XML")?;
        Ok(feed
            .entries()
            .iter()
            .filter_map(|entry| {
                let raw = entry_to_raw(entry, source_url);
                if raw.is_none() {
                    tracing::debug!(id = entry.id(), "skipping incomplete feed entry");
                }
                raw
            })
            .collect())
    }
}

fn entry_to_raw(entry: &Entry, source_url: &str) -> Option<RawEntry> {
    let video_id = video_id(entry)?;

    let title = entry.title().value.trim();
    if title.is_empty() {
        return None;
    }

    let links = entry.links();
    let link = links
        .iter()
        .find(|link| link.rel() == "alternate")
        .or_else(|| links.first())
        .map(|link| link.href().trim())
        .filter(|href| !href.is_empty())?;

    let published = entry.published().unwrap_or_else(|| entry.updated());

    Some(RawEntry {
        source_item_id: video_id,
        source_type: SOURCE_TYPE_YOUTUBE.to_string(),
        source_url: source_url.to_string(),
        title: title.to_string(),
        link: link.to_string(),
        published: published.to_rfc3339(),
    })
}

/// `<yt:videoId>`, else the entry id without its `yt:video:` prefix.
fn video_id(entry: &Entry) -> Option<String> {
    let from_extension = entry
        .extensions()
        .get("yt")
        .and_then(|yt| yt.get("videoId"))
        .and_then(|values| values.first())
        .and_then(|ext| ext.value())
        .map(str::trim)
        .filter(|id| !id.is_empty());

    if let Some(id) = from_extension {
        return Some(id.to_string());
    }

    let id = entry.id().trim();
    let id = id.strip_prefix("yt:video:").unwrap_or(id);
    (!id.is_empty()).then(|| id.to_string())
}

impl DataSource for YoutubeSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn url(&self) -> &str {
        &self.channel_url
    }

    fn fetch(&self) -> Result<Vec<RawEntry>> {
        let feed_url = build_feed_url(&self.channel_id)?;
        let xml = fetch_text(&feed_url)?;
        Self::parse_feed(&xml, &self.channel_url)
            .with_context(|| format!("invalid feed for channel {}", self.channel_id))
    }
}
