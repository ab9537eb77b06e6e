//! TOML sources file.
//!
//! ```toml
//! [[sources]]
//! type = "youtube"
//! url = "https://www.youtube.com/channel/UC..."
//! title = "optional label"
//! ```
//!
//! A file without a `sources` array configures no sources, so an empty file
//! is a valid config.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// The kinds of source a config entry may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Rss,
    Youtube,
    Bilibili,
    Webpage,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [Self::Rss, Self::Youtube, Self::Bilibili, Self::Webpage];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rss => "rss",
            Self::Youtube => "youtube",
            Self::Bilibili => "bilibili",
            Self::Webpage => "webpage",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                format!("'type' must be one of {}, got '{s}'", allowed.join(", "))
            })
    }
}

/// One validated `[[sources]]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub url: String,
    pub title: Option<String>,
}

// Fields are optional here so that a missing key gets a message naming the
// source index instead of a bare TOML error.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    sources: Vec<RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(rename = "type")]
    kind: Option<String>,
    url: Option<String>,
    title: Option<String>,
}

/// Read and validate the sources file at `path`.
pub fn load_sources(path: &Path) -> Result<Vec<SourceConfig>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let sources = parse_sources(&text).map_err(|err| match err {
        ParseFailure::Toml(source) => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        ParseFailure::Invalid(err) => err,
    })?;

    tracing::debug!(path = %path.display(), count = sources.len(), "loaded sources");
    Ok(sources)
}

enum ParseFailure {
    Toml(toml::de::Error),
    Invalid(ConfigError),
}

fn parse_sources(text: &str) -> Result<Vec<SourceConfig>, ParseFailure> {
    let file: ConfigFile = toml::from_str(text).map_err(ParseFailure::Toml)?;

    file.sources
        .into_iter()
        .enumerate()
        .map(|(index, raw)| validate(index, raw).map_err(ParseFailure::Invalid))
        .collect()
}

fn validate(index: usize, raw: RawSource) -> Result<SourceConfig, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidSource { index, reason };

    let kind = raw
        .kind
        .ok_or_else(|| invalid("missing required field 'type'".into()))?;
    let url = raw
        .url
        .ok_or_else(|| invalid("missing required field 'url'".into()))?;

    let kind = kind.parse::<SourceKind>().map_err(invalid)?;
    if url.trim().is_empty() {
        return Err(invalid("'url' cannot be empty".into()));
    }

    Ok(SourceConfig {
        kind,
        url,
        title: raw.title,
    })
}
