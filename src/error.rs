//! Error types for the item model, the JSON store, and config loading.
//!
//! Feed fetching stays on `anyhow` (see [`crate::source::DataSource`]); the
//! types here cover the parts of the crate whose failures callers need to
//! tell apart.

use std::path::PathBuf;

/// A field handed to an [`Item`](crate::item::Item) constructor was malformed.
#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("source_type cannot contain ':' character: {0:?}")]
    ColonInSourceType(String),

    #[error("item_id {0:?} is not in the expected format 'source_type:source_item_id'")]
    MalformedItemId(String),

    #[error("published timestamp must be a string, got {0}")]
    TimestampNotString(String),

    #[error("published timestamp {0:?} has no UTC offset")]
    NaiveTimestamp(String),

    #[error("invalid published timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Loading or saving the JSON item store failed.
///
/// A bad `published` value gets its own variant so callers can report it
/// separately from generic malformed-item problems.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid structure in {path}: missing 'items' key")]
    MissingItems { path: PathBuf },

    #[error("Invalid structure in {path}: 'items' must be a list")]
    ItemsNotArray { path: PathBuf },

    #[error("Invalid item in {path}: item {index} must be an object")]
    ItemNotObject { path: PathBuf, index: usize },

    #[error("Invalid item data in {path}: item {index}: {reason}")]
    InvalidItem {
        path: PathBuf,
        index: usize,
        reason: String,
    },

    #[error("Invalid published timestamp in {path}: item {index}: {source}")]
    InvalidTimestamp {
        path: PathBuf,
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("failed to serialize items for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// True when the failure is a corrupt `published` value rather than a
    /// structural problem with the document.
    pub fn is_timestamp_error(&self) -> bool {
        matches!(self, StorageError::InvalidTimestamp { .. })
    }
}

/// The TOML sources file could not be read or is invalid.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Source at index {index}: {reason}")]
    InvalidSource { index: usize, reason: String },
}

pub type StorageResult<T> = Result<T, StorageError>;
