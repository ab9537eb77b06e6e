//! Recommendation strategies.
//!
//! A [`Recommender`] is a pure ranking function: it takes a candidate list,
//! a size limit, and free-form context, and returns an ordered subset plus
//! metadata explaining what it did.  Recommenders never touch the store;
//! [`recommend_from_store`] is the glue that loads candidates for them.
//!
//! Strategies live in sub-modules (currently [`latest`] and [`keyword`]).

pub mod keyword;
pub mod latest;

pub use keyword::{tokenize, KeywordFromSeenRecommender};
pub use latest::LatestRecommender;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::StorageResult;
use crate::item::Item;
use crate::store::JsonItemStore;

/// Result size used when the caller has no preference.
pub const DEFAULT_LIMIT: usize = 20;

/// Input to a recommender.
#[derive(Debug, Clone)]
pub struct RecommendRequest {
    pub items: Vec<Item>,
    pub limit: usize,
    /// Strategy-specific knobs; the built-in strategies ignore it.
    pub context: BTreeMap<String, Value>,
}

impl RecommendRequest {
    pub fn new(items: Vec<Item>, limit: usize) -> Self {
        Self {
            items,
            limit,
            context: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, context: BTreeMap<String, Value>) -> Self {
        self.context = context;
        self
    }
}

/// Explainability data attached to a result.  Absent fields were not
/// reported by the strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecommendMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Candidates handed to the strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unseen_items: Option<usize>,
    /// True when ranking was restricted to unseen items; false when every
    /// candidate was already seen and the full set was used instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filtered: Option<bool>,
    /// Keyword weights, heaviest first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_keywords: Option<Vec<(String, usize)>>,
    /// Where the candidates came from, set by [`recommend_from_store`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommender: Option<String>,
}

/// Ranked output of a recommender.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendResult {
    pub items: Vec<Item>,
    pub meta: RecommendMeta,
}

/// A ranking strategy.
///
/// Implementations must be side-effect free: same request, same result.
pub trait Recommender {
    /// Strategy name reported in metadata (`latest`, `keyword_from_seen`).
    fn name(&self) -> &'static str;

    fn recommend(&self, req: &RecommendRequest) -> RecommendResult;
}

/// Load every stored item and rank it with `recommender`.
pub fn recommend_from_store(
    store: &JsonItemStore,
    recommender: &dyn Recommender,
    limit: usize,
    context: BTreeMap<String, Value>,
) -> StorageResult<RecommendResult> {
    let items = store.load_all()?;
    let req = RecommendRequest::new(items, limit).with_context(context);

    let mut result = recommender.recommend(&req);
    result.meta.source = Some("store".to_string());
    result.meta.recommender = Some(recommender.name().to_string());
    Ok(result)
}

/// Candidates split for the "prefer unseen" rule shared by the strategies.
struct CandidatePool<'a> {
    items: Vec<&'a Item>,
    total: usize,
    unseen: usize,
    filtered: bool,
}

/// Unseen items if there are any, otherwise every item.
fn prefer_unseen(items: &[Item]) -> CandidatePool<'_> {
    let unseen: Vec<&Item> = items.iter().filter(|item| !item.seen()).collect();
    let unseen_count = unseen.len();

    if unseen.is_empty() {
        CandidatePool {
            items: items.iter().collect(),
            total: items.len(),
            unseen: 0,
            filtered: false,
        }
    } else {
        CandidatePool {
            items: unseen,
            total: items.len(),
            unseen: unseen_count,
            filtered: true,
        }
    }
}
