use docsearch_sections::Section;
use docsearch_vector_store::{tokenize, IndexSnapshot};

/// Terms shorter than this are ignored by keyword scoring and matching
pub const MIN_TERM_CHARS: usize = 3;

const TITLE_WEIGHT: f32 = 3.0;
const BODY_WEIGHT: f32 = 1.0;

/// Raw score per term that maps to a keyword score of 1.0
const SCORE_PER_TERM: f32 = 5.0;

/// Distinct lower-cased query terms of at least [`MIN_TERM_CHARS`]
/// characters, in the order they first appear.
#[must_use]
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for token in tokenize(query) {
        if token.chars().count() >= MIN_TERM_CHARS && !terms.contains(&token) {
            terms.push(token);
        }
    }
    terms
}

/// Literal keyword scoring.
///
/// Each term scores 3 per title occurrence and 1 per body occurrence
/// (case-insensitive); the sum is divided by `terms.len() * 5` and clamped
/// to 1. Sections with no occurrence are left out.
///
/// Returns `(entry index, score)` in snapshot order.
#[must_use]
pub fn keyword_scores(snapshot: &IndexSnapshot, terms: &[String]) -> Vec<(usize, f32)> {
    if terms.is_empty() {
        return Vec::new();
    }

    #[allow(clippy::cast_precision_loss)]
    let max_raw = terms.len() as f32 * SCORE_PER_TERM;

    snapshot
        .entries()
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let raw = raw_score(&entry.section, terms);
            (raw > 0.0).then(|| (idx, (raw / max_raw).min(1.0)))
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn raw_score(section: &Section, terms: &[String]) -> f32 {
    let title = section.title.to_lowercase();
    let body = section.content.to_lowercase();

    terms
        .iter()
        .map(|term| {
            let in_title = title.matches(term.as_str()).count() as f32;
            let in_body = body.matches(term.as_str()).count() as f32;
            TITLE_WEIGHT * in_title + BODY_WEIGHT * in_body
        })
        .sum()
}
