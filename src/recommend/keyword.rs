//! Keyword matching against titles the user has already seen.
//!
//! Titles of seen items are tokenised into a frequency table: each seen
//! item contributes every distinct token once.  Candidates are scored by
//! summing the weights of their own distinct tokens, so a title that repeats
//! a keyword gains nothing, while a keyword that shows up across many seen
//! items weighs more.

use std::collections::{BTreeSet, HashMap};

use super::{prefer_unseen, RecommendMeta, RecommendRequest, RecommendResult, Recommender};
use crate::item::Item;

/// Split a title into lower-case tokens.
///
/// Anything that is not a letter, digit, `#`, or `+` separates tokens, so
/// `C++` and `C#` survive as `c++` and `c#`.
pub fn tokenize(title: &str) -> Vec<String> {
    title
        .split(|c: char| !(c.is_alphanumeric() || c == '#' || c == '+'))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn distinct_tokens(title: &str) -> BTreeSet<String> {
    tokenize(title).into_iter().collect()
}

/// Ranks candidates by overlap with the vocabulary of seen titles.
///
/// With no seen items there is nothing to score against, and the result is
/// empty (unlike [`LatestRecommender`](super::LatestRecommender), which
/// still returns something).
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordFromSeenRecommender;

impl KeywordFromSeenRecommender {
    /// Keyword weights from every seen item's title.
    pub fn keyword_weights(items: &[Item]) -> HashMap<String, usize> {
        let mut weights = HashMap::new();
        for item in items.iter().filter(|item| item.seen()) {
            for token in distinct_tokens(item.title()) {
                *weights.entry(token).or_insert(0) += 1;
            }
        }
        weights
    }

    /// Sum of keyword weights over the distinct tokens of `title`.
    pub fn score(title: &str, weights: &HashMap<String, usize>) -> usize {
        distinct_tokens(title)
            .iter()
            .filter_map(|token| weights.get(token))
            .sum()
    }
}

/// Table entries heaviest first, then alphabetically.
fn ranked_keywords(weights: &HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut keywords: Vec<(String, usize)> = weights
        .iter()
        .map(|(keyword, weight)| (keyword.clone(), *weight))
        .collect();
    keywords.sort_by(|(ka, wa), (kb, wb)| wb.cmp(wa).then_with(|| ka.cmp(kb)));
    keywords
}

impl Recommender for KeywordFromSeenRecommender {
    fn name(&self) -> &'static str {
        "keyword_from_seen"
    }

    fn recommend(&self, req: &RecommendRequest) -> RecommendResult {
        let pool = prefer_unseen(&req.items);
        let has_seen = req.items.iter().any(Item::seen);

        let mut meta = RecommendMeta {
            strategy: Some(self.name().to_string()),
            limit: Some(req.limit),
            total_items: Some(pool.total),
            unseen_items: Some(pool.unseen),
            filtered: Some(pool.filtered),
            top_keywords: Some(Vec::new()),
            ..Default::default()
        };

        if !has_seen {
            return RecommendResult {
                items: Vec::new(),
                meta,
            };
        }

        let weights = Self::keyword_weights(&req.items);

        let mut scored: Vec<(usize, &Item)> = pool
            .items
            .into_iter()
            .map(|item| (Self::score(item.title(), &weights), item))
            .collect();
        // Score descending, then the canonical newest-first / id order.
        scored.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then_with(|| a.cmp(b)));
        scored.truncate(req.limit);

        meta.top_keywords = Some(ranked_keywords(&weights));
        RecommendResult {
            items: scored.into_iter().map(|(_, item)| item.clone()).collect(),
            meta,
        }
    }
}
