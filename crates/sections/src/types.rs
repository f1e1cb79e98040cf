use crate::error::{Result, SectionError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Deepest heading level recognised by the extractor
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Ordinal of a section within one document version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub usize);

impl SectionId {
    #[must_use]
    pub const fn ordinal(self) -> usize {
        self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "section-{}", self.0)
    }
}

/// A contiguous document span headed by one heading line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Stable within one document version
    pub id: SectionId,

    /// URL-safe identifier derived from the title, unique per document
    pub slug: String,

    /// Heading text without markers
    pub title: String,

    /// Hierarchy level (1-6)
    pub level: u8,

    /// Heading line as it appeared in the source (trailing whitespace removed)
    pub heading: String,

    /// Body text, trimmed at the edges
    pub content: String,

    /// Line of the heading (1-indexed)
    pub start_line: usize,

    /// Last line before the next heading (1-indexed, inclusive)
    pub end_line: usize,
}

impl Section {
    /// Heading line followed by the body, the unit [`reconstruct`] joins
    #[must_use]
    pub fn render(&self) -> String {
        if self.content.is_empty() {
            self.heading.clone()
        } else {
            format!("{}\n{}", self.heading, self.content)
        }
    }

    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// Rebuild document text from its sections.
///
/// Equal to the source up to whitespace trimming; text before the first
/// heading belongs to no section and is not reproduced.
#[must_use]
pub fn reconstruct(sections: &[Section]) -> String {
    sections
        .iter()
        .map(Section::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check the invariants a caller-supplied section set must satisfy
/// before it can be indexed.
pub fn validate_sections<'a, I>(sections: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Section>,
{
    let mut slugs = HashSet::new();
    let mut ids = HashSet::new();

    for section in sections {
        if section.level == 0 || section.level > MAX_HEADING_LEVEL {
            return Err(SectionError::InvalidLevel {
                title: section.title.clone(),
                level: section.level,
            });
        }
        if section.end_line < section.start_line {
            return Err(SectionError::InvalidLines {
                title: section.title.clone(),
                start: section.start_line,
                end: section.end_line,
            });
        }
        if !slugs.insert(section.slug.as_str()) {
            return Err(SectionError::DuplicateSlug(section.slug.clone()));
        }
        if !ids.insert(section.id) {
            return Err(SectionError::DuplicateId(section.id.to_string()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: usize, slug: &str, level: u8) -> Section {
        Section {
            id: SectionId(id),
            slug: slug.to_string(),
            title: slug.to_string(),
            level,
            heading: format!("{} {slug}", "#".repeat(level as usize)),
            content: String::new(),
            start_line: 1,
            end_line: 1,
        }
    }

    #[test]
    fn id_displays_with_prefix() {
        assert_eq!(SectionId(3).to_string(), "section-3");
    }

    #[test]
    fn render_omits_empty_body() {
        let mut s = section(0, "intro", 1);
        assert_eq!(s.render(), "# intro");
        s.content = "hello".to_string();
        assert_eq!(s.render(), "# intro\nhello");
    }

    #[test]
    fn validate_rejects_duplicate_slugs() {
        let sections = vec![section(0, "a", 1), section(1, "a", 2)];
        assert_eq!(
            validate_sections(&sections),
            Err(SectionError::DuplicateSlug("a".to_string()))
        );
    }

    #[test]
    fn validate_rejects_bad_level() {
        let sections = vec![section(0, "a", 7)];
        assert!(matches!(
            validate_sections(&sections),
            Err(SectionError::InvalidLevel { level: 7, .. })
        ));
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let sections = vec![section(0, "a", 1), section(0, "b", 1)];
        assert!(matches!(
            validate_sections(&sections),
            Err(SectionError::DuplicateId(_))
        ));
    }

    #[test]
    fn validate_accepts_empty_set() {
        assert!(validate_sections(&Vec::<Section>::new()).is_ok());
    }
}
