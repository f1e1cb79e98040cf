//! # Docsearch Search
//!
//! Answers free-text queries against the live index snapshot with two
//! independent strategies and one merged ranking.
//!
//! ```text
//! query
//!   ├──> keyword: 3 × title hits + body hits, normalized per term
//!   ├──> vector:  cosine(query vector, section vector) ≥ min_score
//!   └──> fusion:  0.6 × vector + 0.4 × keyword (single hits keep their score)
//!          └─> sorted, truncated, annotated with literal matches
//! ```

mod config;
mod error;
mod fusion;
mod hybrid;
mod keyword;
mod matches;
mod types;

pub use config::{SearchConfig, SearchConfigUpdate, MAX_LIMIT};
pub use error::{Result, SearchError};
pub use fusion::ScoreFusion;
pub use hybrid::HybridSearch;
pub use keyword::{keyword_scores, query_terms, MIN_TERM_CHARS};
pub use matches::TermMatcher;
pub use types::{SearchResponse, SearchResult, SectionView};
