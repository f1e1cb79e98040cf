use crate::config::{SearchConfig, SearchConfigUpdate, MAX_LIMIT};
use crate::error::{Result, SearchError};
use crate::fusion::ScoreFusion;
use crate::keyword::{keyword_scores, query_terms};
use crate::matches::TermMatcher;
use crate::types::{SearchResponse, SearchResult, SectionView};
use docsearch_vector_store::{cosine_similarity, IndexSnapshot, IndexStore, VectorStoreError};
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Hybrid search combining vector similarity and literal keyword scoring
pub struct HybridSearch {
    store: Arc<IndexStore>,
    config: RwLock<SearchConfig>,
}

enum VectorOutcome {
    Scored(Vec<(usize, f32)>),
    Skipped,
}

impl HybridSearch {
    pub fn new(store: Arc<IndexStore>, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config: RwLock::new(config),
        })
    }

    #[must_use]
    pub fn with_defaults(store: Arc<IndexStore>) -> Self {
        Self {
            store,
            config: RwLock::new(SearchConfig::default()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Copy of the active configuration
    pub fn config(&self) -> Result<SearchConfig> {
        self.config
            .read()
            .map(|config| config.clone())
            .map_err(|_| SearchError::LockPoisoned)
    }

    /// Apply a partial update. An invalid result leaves the current
    /// configuration untouched.
    pub fn update_config(&self, update: &SearchConfigUpdate) -> Result<SearchConfig> {
        let mut guard = self.config.write().map_err(|_| SearchError::LockPoisoned)?;
        let next = guard.merged(update)?;
        *guard = next.clone();
        log::debug!("Search config updated: {next:?}");
        Ok(next)
    }

    /// Rank sections of the live snapshot against `query`.
    ///
    /// `limit` defaults to `max_results` and must lie in `1..=100`.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<SearchResponse> {
        self.run(query, limit, None)
    }

    /// Like [`search`](Self::search), but once `deadline` passes vector
    /// scoring is abandoned and keyword results are returned alone.
    pub fn search_with_deadline(
        &self,
        query: &str,
        limit: Option<usize>,
        deadline: Instant,
    ) -> Result<SearchResponse> {
        self.run(query, limit, Some(deadline))
    }

    fn run(
        &self,
        query: &str,
        limit: Option<usize>,
        deadline: Option<Instant>,
    ) -> Result<SearchResponse> {
        let started = Instant::now();
        let config = self.config()?;

        let limit = match limit {
            Some(limit) if limit == 0 || limit > MAX_LIMIT => {
                return Err(SearchError::InvalidLimit {
                    limit,
                    max: MAX_LIMIT,
                });
            }
            Some(limit) => limit,
            None => config.max_results,
        };

        let query = query.trim();
        let chars = query.chars().count();
        if chars > config.max_query_chars {
            return Err(SearchError::QueryTooLong {
                chars,
                max: config.max_query_chars,
            });
        }

        let snapshot = self.store.current();
        if query.is_empty() {
            return Ok(SearchResponse::empty(query, snapshot.generation()));
        }

        let terms = query_terms(query);

        let keyword = if config.keyword_enabled {
            keyword_scores(&snapshot, &terms)
        } else {
            Vec::new()
        };

        let (vector, vector_skipped) = if config.vector_enabled {
            match self.vector_scores(&snapshot, query, config.min_score, deadline)? {
                VectorOutcome::Scored(scores) => (scores, false),
                VectorOutcome::Skipped => (Vec::new(), true),
            }
        } else {
            (Vec::new(), false)
        };

        log::debug!(
            "Query '{}': {} vector hits, {} keyword hits",
            query,
            vector.len(),
            keyword.len()
        );

        let mut fused = ScoreFusion::from_config(&config).fuse(&vector, &keyword);
        let total_results = fused.len();
        fused.truncate(limit);

        let matcher = TermMatcher::new(&terms);
        let entries = snapshot.entries();
        let results: Vec<SearchResult> = fused
            .into_iter()
            .filter_map(|(idx, score)| {
                entries.get(idx).map(|entry| SearchResult {
                    section: SectionView::from(&entry.section),
                    score,
                    matches: matcher.find(&entry.section.content),
                })
            })
            .collect();

        let search_time_ms = started.elapsed().as_secs_f64() * 1000.0;
        log::debug!(
            "Search completed in {:.2}ms: {} of {} results (generation {})",
            search_time_ms,
            results.len(),
            total_results,
            snapshot.generation()
        );

        Ok(SearchResponse {
            query: query.to_string(),
            results,
            total_results,
            search_time_ms,
            generation: snapshot.generation(),
            vector_skipped,
        })
    }

    fn vector_scores(
        &self,
        snapshot: &IndexSnapshot,
        query: &str,
        min_score: f32,
        deadline: Option<Instant>,
    ) -> Result<VectorOutcome> {
        let embedder = self.store.embedder();
        if !embedder.is_ready() {
            log::warn!("Vectorizer not ready; falling back to keyword search");
            return Ok(VectorOutcome::Skipped);
        }
        if snapshot.is_empty() {
            return Ok(VectorOutcome::Scored(Vec::new()));
        }
        if !snapshot.is_vectorized() {
            log::debug!(
                "Snapshot generation {} has no vectors; keyword search only",
                snapshot.generation()
            );
            return Ok(VectorOutcome::Skipped);
        }

        let query_vector = embedder.embed(query)?;
        if query_vector.len() != snapshot.dimension() {
            return Err(VectorStoreError::InvalidDimension {
                expected: snapshot.dimension(),
                actual: query_vector.len(),
            }
            .into());
        }

        let mut scores = Vec::new();
        for (idx, entry) in snapshot.entries().iter().enumerate() {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                log::debug!("Search deadline passed after {idx} sections; dropping vector scores");
                return Ok(VectorOutcome::Skipped);
            }
            let Some(vector) = entry.vector.as_deref() else {
                return Err(VectorStoreError::CorruptSnapshot(format!(
                    "section '{}' is missing its vector",
                    entry.section.slug
                ))
                .into());
            };
            let similarity = cosine_similarity(&query_vector, vector)?;
            if similarity > 0.0 && similarity >= min_score {
                scores.push((idx, similarity));
            }
        }
        Ok(VectorOutcome::Scored(scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsearch_sections::extract_sections;
    use docsearch_vector_store::{Embedder, HashingEmbedder, VectorizerConfig};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const DOC: &str = "\
# Brand Colors
blue #3b82f6 is the primary color

# Typography
Inter for body text, Space Grotesk for headings

# Spacing
Use a 4px grid for margins and padding
";

    fn engine_with(embedder: HashingEmbedder, text: &str) -> HybridSearch {
        let store = Arc::new(IndexStore::new(Arc::new(embedder)));
        store.rebuild(extract_sections(text)).unwrap();
        HybridSearch::with_defaults(store)
    }

    fn engine(text: &str) -> HybridSearch {
        engine_with(
            HashingEmbedder::ready(VectorizerConfig::default()).unwrap(),
            text,
        )
    }

    #[test]
    fn empty_query_returns_nothing() {
        let search = engine(DOC);
        for query in ["", "   ", "\n\t"] {
            let response = search.search(query, None).unwrap();
            assert!(response.results.is_empty());
            assert_eq!(response.total_results, 0);
        }
    }

    #[test]
    fn finds_brand_colors_first() {
        let search = engine(DOC);
        let response = search.search("brand colors", None).unwrap();
        let top = &response.results[0];
        assert_eq!(top.section.slug, "brand-colors");
        assert!(top.score > 0.0);
        for other in &response.results[1..] {
            assert!(other.score < top.score);
        }
    }

    #[test]
    fn zero_similarity_is_not_a_vector_hit() {
        let search = engine("# ---\n...\n# Colors\nblue and slate");
        search
            .update_config(&SearchConfigUpdate {
                min_score: Some(0.0),
                keyword_enabled: Some(false),
                ..SearchConfigUpdate::default()
            })
            .unwrap();

        let response = search.search("blue slate", None).unwrap();
        let slugs: Vec<&str> = response
            .results
            .iter()
            .map(|r| r.section.slug.as_str())
            .collect();
        assert_eq!(slugs, vec!["colors"]);
    }

    #[test]
    fn limit_out_of_range_is_rejected() {
        let search = engine(DOC);
        for limit in [0, 101] {
            let err = search.search("colors", Some(limit)).unwrap_err();
            assert!(matches!(err, SearchError::InvalidLimit { .. }));
            assert!(err.is_input_error());
        }
    }

    #[test]
    fn limit_truncates_but_total_counts_all() {
        let search = engine("# Grid one\ngrid\n# Grid two\ngrid\n# Grid three\ngrid");
        let response = search.search("grid", Some(1)).unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.total_results, 3);
    }

    #[test]
    fn overlong_query_is_rejected() {
        let search = engine(DOC);
        search
            .update_config(&SearchConfigUpdate {
                max_query_chars: Some(5),
                ..SearchConfigUpdate::default()
            })
            .unwrap();
        let err = search.search("typography", None).unwrap_err();
        assert!(matches!(err, SearchError::QueryTooLong { chars: 10, max: 5 }));
    }

    #[test]
    fn both_strategies_disabled_returns_nothing() {
        let search = engine(DOC);
        search
            .update_config(&SearchConfigUpdate {
                vector_enabled: Some(false),
                keyword_enabled: Some(false),
                ..SearchConfigUpdate::default()
            })
            .unwrap();
        let response = search.search("brand colors", None).unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.total_results, 0);
    }

    #[test]
    fn unready_vectorizer_degrades_to_keyword() {
        let search = engine_with(
            HashingEmbedder::new(VectorizerConfig::default()).unwrap(),
            DOC,
        );
        let response = search.search("typography", None).unwrap();
        assert!(response.vector_skipped);
        assert_eq!(response.results[0].section.slug, "typography");
    }

    #[test]
    fn keyword_only_scores_match_formula() {
        let search = engine(DOC);
        search
            .update_config(&SearchConfigUpdate {
                vector_enabled: Some(false),
                ..SearchConfigUpdate::default()
            })
            .unwrap();
        let response = search.search("typography", None).unwrap();
        assert_eq!(response.results.len(), 1);
        assert!((response.results[0].score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn matches_report_body_terms() {
        let search = engine(DOC);
        let response = search.search("grid margins brand", None).unwrap();
        let spacing = response
            .results
            .iter()
            .find(|r| r.section.slug == "spacing")
            .unwrap();
        assert_eq!(spacing.matches, vec!["grid".to_string(), "margins".to_string()]);
    }

    #[test]
    fn repeated_search_is_stable() {
        let search = engine(DOC);
        let first = search.search("color grid text", None).unwrap();
        let second = search.search("color grid text", None).unwrap();
        assert_eq!(first.results, second.results);
        assert_eq!(first.total_results, second.total_results);
    }

    #[test]
    fn past_deadline_skips_vector_scoring() {
        let search = engine(DOC);
        let deadline = Instant::now()
            .checked_sub(Duration::from_millis(1))
            .unwrap_or_else(Instant::now);
        let response = search
            .search_with_deadline("typography", None, deadline)
            .unwrap();
        assert!(response.vector_skipped);
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].section.slug, "typography");
    }

    #[test]
    fn invalid_update_keeps_old_config() {
        let search = engine(DOC);
        let before = search.config().unwrap();
        let err = search
            .update_config(&SearchConfigUpdate {
                min_score: Some(-1.0),
                ..SearchConfigUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidConfig(_)));
        assert_eq!(search.config().unwrap(), before);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let store = Arc::new(IndexStore::new(Arc::new(
            HashingEmbedder::ready(VectorizerConfig::default()).unwrap(),
        )));
        let config = SearchConfig {
            max_results: 0,
            ..SearchConfig::default()
        };
        assert!(HybridSearch::new(store, config).is_err());
    }

    struct ShortVectors;

    impl Embedder for ShortVectors {
        fn dimension(&self) -> usize {
            4
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn embed(&self, text: &str) -> docsearch_vector_store::Result<Vec<f32>> {
            // Section texts contain a newline; queries never do.
            if text.contains('\n') {
                Ok(vec![1.0, 0.0, 0.0, 0.0])
            } else {
                Ok(vec![1.0, 0.0])
            }
        }
    }

    #[test]
    fn dimension_mismatch_fails_loudly() {
        let store = Arc::new(IndexStore::new(Arc::new(ShortVectors)));
        store.rebuild(extract_sections("# A\nalpha")).unwrap();
        let search = HybridSearch::with_defaults(store);
        let err = search.search("alpha", None).unwrap_err();
        assert!(matches!(
            err,
            SearchError::VectorStore(VectorStoreError::InvalidDimension {
                expected: 4,
                actual: 2
            })
        ));
    }
}
