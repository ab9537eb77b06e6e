//! Newest-first recommendations.

use super::{prefer_unseen, RecommendMeta, RecommendRequest, RecommendResult, Recommender};

/// Recommends the most recently published items, unseen ones first.
///
/// When every candidate has already been seen the full candidate set is
/// ranked instead, and `filtered` is reported as `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatestRecommender;

impl Recommender for LatestRecommender {
    fn name(&self) -> &'static str {
        "latest"
    }

    fn recommend(&self, req: &RecommendRequest) -> RecommendResult {
        let pool = prefer_unseen(&req.items);

        let mut ranked = pool.items;
        // `Item`'s `Ord` is newest-first with an item_id tie-break.
        ranked.sort();
        ranked.truncate(req.limit);

        RecommendResult {
            items: ranked.into_iter().cloned().collect(),
            meta: RecommendMeta {
                strategy: Some(self.name().to_string()),
                limit: Some(req.limit),
                total_items: Some(pool.total),
                unseen_items: Some(pool.unseen),
                filtered: Some(pool.filtered),
                ..Default::default()
            },
        }
    }
}
