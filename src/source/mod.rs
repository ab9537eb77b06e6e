//! Data source abstraction layer.
//!
//! This module defines the [`DataSource`] trait.  Concrete source
//! implementations live in sub-modules ([`rss`] and [`youtube`]); both hand
//! back [`RawEntry`] values, and turning those into stored items is the
//! caller's job.
//!
//! ## For contributors: adding a new source
//!
//! 1. Create a new file in this directory (e.g. `bilibili.rs`).
//! 2. Define a struct (e.g. `BilibiliSource`) and implement [`DataSource`]
//!    for it.  Keep parsing in a pure function so tests need no network.
//! 3. Add `mod bilibili;` below and re-export your struct in the `pub use`
//!    block.
//! 4. Map its [`SourceKind`] to a constructor in [`from_config`].

mod rss;
mod youtube;

pub use self::rss::RssSource;
pub use self::youtube::{build_feed_url, extract_channel_id, YoutubeSource};

use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::{SourceConfig, SourceKind};
use crate::item::RawEntry;

/// Per-request timeout for feed downloads.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait that every data source must implement.
///
/// ## Implementing a new source
///
/// ```ignore
/// pub struct MySource { /* config fields */ }
///
/// impl DataSource for MySource {
///     fn name(&self) -> &str { "my-source" }
///
///     fn url(&self) -> &str { "https://example.com/feed" }
///
///     fn fetch(&self) -> Result<Vec<RawEntry>> {
///         // Perform HTTP / IO, then convert into RawEntry values.
///         todo!()
///     }
/// }
/// ```
pub trait DataSource: Send {
    /// Human-readable label used in logs.
    fn name(&self) -> &str;

    /// The configured URL; fetched entries carry it as their `source_url`.
    fn url(&self) -> &str;

    /// Fetch the current batch of entries.
    fn fetch(&self) -> Result<Vec<RawEntry>>;
}

/// Build the fetcher for a config entry.
///
/// Returns `Ok(None)` for kinds that have no fetcher yet.
pub fn from_config(config: &SourceConfig) -> Result<Option<Box<dyn DataSource>>> {
    let label = config.title.clone().unwrap_or_else(|| config.url.clone());

    let source: Box<dyn DataSource> = match config.kind {
        SourceKind::Rss => Box::new(RssSource::new(&config.url, label)),
        SourceKind::Youtube => Box::new(YoutubeSource::from_channel_url(&config.url, label)?),
        SourceKind::Bilibili | SourceKind::Webpage => return Ok(None),
    };
    Ok(Some(source))
}

/// GET `url` and return the body as text.
pub(crate) fn fetch_text(url: &str) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let body = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .with_context(|| format!("failed to fetch {url}"))?
        .text()
        .with_context(|| format!("failed to read response from {url}"))?;

    tracing::debug!(url, bytes = body.len(), "downloaded feed");
    Ok(body)
}
