use docsearch_sections::{Section, SectionId};
use serde::{Deserialize, Serialize};

/// The part of a section returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionView {
    pub id: SectionId,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub level: u8,
}

impl From<&Section> for SectionView {
    fn from(section: &Section) -> Self {
        Self {
            id: section.id,
            slug: section.slug.clone(),
            title: section.title.clone(),
            content: section.content.clone(),
            level: section.level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub section: SectionView,

    /// Hybrid score in [0, 1]
    pub score: f32,

    /// Query terms literally present in the body
    pub matches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,

    /// Merged candidates before truncation to the limit
    pub total_results: usize,

    pub search_time_ms: f64,

    /// Snapshot the query ran against
    pub generation: u64,

    /// Vector scoring was enabled but contributed nothing (not ready or
    /// deadline passed)
    pub vector_skipped: bool,
}

impl SearchResponse {
    pub(crate) fn empty(query: &str, generation: u64) -> Self {
        Self {
            query: query.to_string(),
            results: Vec::new(),
            total_results: 0,
            search_time_ms: 0.0,
            generation,
            vector_skipped: false,
        }
    }
}
