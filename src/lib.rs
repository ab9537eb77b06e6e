//! tech-tracker: collect YouTube and RSS items into a local JSON store and
//! recommend what to look at next.
//!
//! ## Layout
//!
//! * **`item` / `item_id`**: the [`Item`] type and namespaced identifiers.
//! * **`store`**: [`JsonItemStore`], the deduplicating JSON file store.
//! * **`recommend`**: the [`Recommender`] trait and its strategies.
//! * **`render`**: Markdown reports of recommendation results.
//! * **`config` / `source/`**: the TOML sources file and feed fetchers.
//! * **`yt_dlp`**: conversion of yt-dlp `videos.jsonl` dumps.
//! * **`commands`**: the operations behind each CLI subcommand.
//! * **`app` / `ui` / `input`**: the interactive `browse` view.

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod item;
pub mod item_id;
pub mod recommend;
pub mod render;
pub mod source;
pub mod store;
pub mod ui;
pub mod yt_dlp;

pub use error::{ConfigError, StorageError, ValidationError};
pub use item::{Item, RawEntry};
pub use recommend::{
    KeywordFromSeenRecommender, LatestRecommender, RecommendMeta, RecommendRequest,
    RecommendResult, Recommender,
};
pub use store::JsonItemStore;
