use crate::config::SearchConfig;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Weighted union of vector and keyword candidates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreFusion {
    vector_weight: f32,
    keyword_weight: f32,
    single_strategy_factor: f32,
}

#[derive(Default)]
struct Candidate {
    vector: Option<f32>,
    keyword: Option<f32>,
}

impl ScoreFusion {
    #[must_use]
    pub const fn new(vector_weight: f32, keyword_weight: f32, single_strategy_factor: f32) -> Self {
        Self {
            vector_weight,
            keyword_weight,
            single_strategy_factor,
        }
    }

    #[must_use]
    pub const fn from_config(config: &SearchConfig) -> Self {
        Self::new(
            config.vector_weight,
            config.keyword_weight,
            config.single_strategy_factor,
        )
    }

    /// Merge two `(entry index, score)` lists.
    ///
    /// A section in both lists scores `vector_weight * v + keyword_weight * k`;
    /// a section in one list keeps its score times `single_strategy_factor`.
    /// Output is ordered by descending score, ties by entry index.
    #[must_use]
    pub fn fuse(&self, vector: &[(usize, f32)], keyword: &[(usize, f32)]) -> Vec<(usize, f32)> {
        let mut candidates: BTreeMap<usize, Candidate> = BTreeMap::new();
        for &(idx, score) in vector {
            candidates.entry(idx).or_default().vector = Some(score);
        }
        for &(idx, score) in keyword {
            candidates.entry(idx).or_default().keyword = Some(score);
        }

        let mut fused: Vec<(usize, f32)> = candidates
            .into_iter()
            .filter_map(|(idx, candidate)| {
                let score = match (candidate.vector, candidate.keyword) {
                    (Some(v), Some(k)) => self.vector_weight * v + self.keyword_weight * k,
                    (Some(single), None) | (None, Some(single)) => {
                        single * self.single_strategy_factor
                    }
                    (None, None) => return None,
                };
                Some((idx, score.clamp(0.0, 1.0)))
            })
            .collect();

        sort_ranked(&mut fused);
        fused
    }
}

impl Default for ScoreFusion {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

/// Descending score, ascending index on ties
pub fn sort_ranked(results: &mut [(usize, f32)]) {
    results.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}
