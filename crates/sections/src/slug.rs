use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s-]+").expect("valid regex"));

const FALLBACK_SLUG: &str = "section";

/// Derive a URL-safe slug from a heading title.
///
/// Lower-cases, drops everything outside word/space/hyphen characters and
/// collapses whitespace/hyphen runs into a single hyphen. Leading and
/// trailing hyphens are removed.
#[must_use]
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let collapsed = SEPARATORS.replace_all(stripped.trim(), "-");
    collapsed.trim_matches('-').to_string()
}

/// Hands out unique slugs within one document version.
///
/// The first title keeps its base slug; later collisions get `-2`, `-3`, ...
#[derive(Debug, Default)]
pub struct SlugRegistry {
    taken: HashSet<String>,
}

impl SlugRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, title: &str) -> String {
        let mut base = slugify(title);
        if base.is_empty() {
            base = FALLBACK_SLUG.to_string();
        }

        if self.taken.insert(base.clone()) {
            return base;
        }

        let mut suffix = 2usize;
        loop {
            let candidate = format!("{base}-{suffix}");
            if self.taken.insert(candidate.clone()) {
                log::debug!("Slug collision on '{base}', assigned '{candidate}'");
                return candidate;
            }
            suffix += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn slugifies_simple_title() {
        assert_eq!(slugify("Brand Colors"), "brand-colors");
    }

    #[test]
    fn strips_punctuation_and_collapses_separators() {
        assert_eq!(slugify("  What's new -- in v2.0?  "), "whats-new-in-v20");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn registry_suffixes_collisions() {
        let mut registry = SlugRegistry::new();
        assert_eq!(registry.assign("Usage"), "usage");
        assert_eq!(registry.assign("Usage"), "usage-2");
        assert_eq!(registry.assign("usage!"), "usage-3");
    }

    #[test]
    fn registry_skips_literal_suffix_titles() {
        let mut registry = SlugRegistry::new();
        assert_eq!(registry.assign("Notes 2"), "notes-2");
        assert_eq!(registry.assign("Notes"), "notes");
        assert_eq!(registry.assign("Notes"), "notes-3");
    }

    #[test]
    fn empty_slug_falls_back() {
        let mut registry = SlugRegistry::new();
        assert_eq!(registry.assign("???"), "section");
        assert_eq!(registry.assign("!!!"), "section-2");
    }

    proptest! {
        #[test]
        fn proptest_slug_is_url_safe(title in ".{0,40}") {
            let slug = slugify(&title);
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
            prop_assert!(!slug.chars().any(char::is_whitespace));
        }
    }
}
