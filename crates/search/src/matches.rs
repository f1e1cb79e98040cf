use regex::Regex;

/// Word-boundary, case-insensitive matchers for a query's terms.
///
/// Reporting only: which terms literally occur in a section body has no
/// effect on its score.
pub struct TermMatcher {
    patterns: Vec<(String, Regex)>,
}

impl TermMatcher {
    /// `terms` are expected lower-cased and distinct (see `query_terms`)
    #[must_use]
    pub fn new(terms: &[String]) -> Self {
        let patterns = terms
            .iter()
            .filter_map(|term| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(term));
                match Regex::new(&pattern) {
                    Ok(re) => Some((term.clone(), re)),
                    Err(err) => {
                        log::warn!("Skipping match term '{term}': {err}");
                        None
                    }
                }
            })
            .collect();
        Self { patterns }
    }

    /// Terms occurring in `body`, in query order
    #[must_use]
    pub fn find(&self, body: &str) -> Vec<String> {
        self.patterns
            .iter()
            .filter(|(_, re)| re.is_match(body))
            .map(|(term, _)| term.clone())
            .collect()
    }
}
