use wardrobe_color::Lab;

use crate::types::{QueryResult, RerankConfig};

/// Attributes of the garment a search is issued for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RerankQuery {
    pub category: Option<String>,
    pub color: Option<Lab>,
}

impl RerankQuery {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.color.is_none()
    }
}

/// Rescores nearest-neighbor candidates by category and color agreement.
#[derive(Debug, Clone, Default)]
pub struct ReRanker {
    cfg: RerankConfig,
}

impl ReRanker {
    pub fn new(cfg: RerankConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &RerankConfig {
        &self.cfg
    }

    /// Recomputes `similarity` for every candidate from its `base_score`,
    /// sorts by it (stable, descending) and keeps `top_k`.
    ///
    /// A missing category or color on either side skips that factor.
    pub fn rerank(
        &self,
        mut candidates: Vec<QueryResult>,
        query: &RerankQuery,
        top_k: usize,
    ) -> Vec<QueryResult> {
        for c in candidates.iter_mut() {
            let mut score = c.base_score;

            if let (Some(want), Some(got)) = (&query.category, &c.item.category) {
                if want.eq_ignore_ascii_case(got) {
                    score *= self.cfg.category_boost;
                }
            }

            c.color_distance = None;
            if let (Some(want), Some(got)) = (&query.color, &c.item.color_lab) {
                let distance = want.distance(got);
                if let Some(boost) = self.color_boost(distance) {
                    score *= boost;
                }
                c.color_distance = Some(distance);
            }

            c.similarity = score;
        }

        candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        candidates.truncate(top_k);
        candidates
    }

    /// Multiplier for a color distance, or `None` when the colors are
    /// noticeably different. Never exceeds `1 + color_weight`.
    pub fn color_boost(&self, distance: f32) -> Option<f32> {
        if distance.is_nan() || distance >= self.cfg.color_threshold {
            return None;
        }
        let closeness = if self.cfg.color_scale > 0.0 {
            (1.0 - distance / self.cfg.color_scale).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some(1.0 + self.cfg.color_weight * closeness)
    }
}
