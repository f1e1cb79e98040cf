use crate::slug::SlugRegistry;
use crate::types::{Section, SectionId, MAX_HEADING_LEVEL};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})[ \t]+(.*?)[ \t]*$").expect("valid regex"));
static CLOSING_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[ \t]+)#+$").expect("valid regex"));

/// Configuration for section extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Headings deeper than this are treated as body text
    pub max_level: u8,

    /// Ignore heading-like lines inside ``` / ~~~ fences
    pub respect_code_fences: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_level: MAX_HEADING_LEVEL,
            respect_code_fences: true,
        }
    }
}

/// Splits raw text into heading-delimited sections
#[derive(Debug, Clone, Default)]
pub struct SectionExtractor {
    config: ExtractorConfig,
}

/// Section under construction while scanning
struct OpenSection<'a> {
    heading: &'a str,
    title: String,
    level: u8,
    start_line: usize,
    body: Vec<&'a str>,
}

impl<'a> OpenSection<'a> {
    fn close(self, end_line: usize, ordinal: usize, slugs: &mut SlugRegistry) -> Section {
        let slug = slugs.assign(&self.title);
        Section {
            id: SectionId(ordinal),
            slug,
            title: self.title,
            level: self.level,
            heading: self.heading.trim_end().to_string(),
            content: self.body.join("\n").trim().to_string(),
            start_line: self.start_line,
            end_line: end_line.max(self.start_line),
        }
    }
}

impl SectionExtractor {
    #[must_use]
    pub fn new(config: ExtractorConfig) -> Self {
        let max_level = config.max_level.clamp(1, MAX_HEADING_LEVEL);
        Self {
            config: ExtractorConfig {
                max_level,
                ..config
            },
        }
    }

    /// Extract sections in document order.
    ///
    /// Text before the first heading belongs to no section; a document
    /// without headings yields no sections.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<Section> {
        let mut sections = Vec::new();
        let mut slugs = SlugRegistry::new();
        let mut open: Option<OpenSection<'_>> = None;
        let mut fence: Option<char> = None;
        let mut last_line = 0usize;

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            last_line = line_no;

            if self.config.respect_code_fences {
                if let Some(marker) = fence_marker(line) {
                    fence = match fence {
                        Some(current) if current == marker => None,
                        Some(current) => Some(current),
                        None => Some(marker),
                    };
                    if let Some(section) = open.as_mut() {
                        section.body.push(line);
                    }
                    continue;
                }
            }

            if fence.is_none() {
                if let Some((level, title)) = self.parse_heading(line) {
                    if let Some(section) = open.take() {
                        let ordinal = sections.len();
                        sections.push(section.close(line_no - 1, ordinal, &mut slugs));
                    }
                    open = Some(OpenSection {
                        heading: line,
                        title,
                        level,
                        start_line: line_no,
                        body: Vec::new(),
                    });
                    continue;
                }
            }

            if let Some(section) = open.as_mut() {
                section.body.push(line);
            }
        }

        if let Some(section) = open.take() {
            let ordinal = sections.len();
            sections.push(section.close(last_line, ordinal, &mut slugs));
        }

        log::debug!(
            "Extracted {} sections from {} lines",
            sections.len(),
            last_line
        );
        sections
    }

    fn parse_heading(&self, line: &str) -> Option<(u8, String)> {
        let caps = HEADING.captures(line)?;
        let level = u8::try_from(caps.get(1)?.as_str().len()).ok()?;
        if level > self.config.max_level {
            return None;
        }

        let raw_title = caps.get(2).map_or("", |m| m.as_str());
        let title = CLOSING_MARKERS.replace(raw_title, "").trim().to_string();
        if title.is_empty() {
            return None;
        }
        Some((level, title))
    }
}

fn fence_marker(line: &str) -> Option<char> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("```") {
        Some('`')
    } else if trimmed.starts_with("~~~") {
        Some('~')
    } else {
        None
    }
}

/// Extract sections with the default configuration
#[must_use]
pub fn extract_sections(text: &str) -> Vec<Section> {
    SectionExtractor::default().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = "\
# Design System

Overview of the system.

## Brand Colors

blue #3b82f6
green #22c55e

## Typography
Inter everywhere.
### Headings ###
Bold.
";

    #[test]
    fn splits_on_headings() {
        let sections = extract_sections(DOC);
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Design System", "Brand Colors", "Typography", "Headings"]
        );
        let levels: Vec<u8> = sections.iter().map(|s| s.level).collect();
        assert_eq!(levels, vec![1, 2, 2, 3]);
    }

    #[test]
    fn tracks_line_ranges() {
        let sections = extract_sections(DOC);
        assert_eq!((sections[0].start_line, sections[0].end_line), (1, 4));
        assert_eq!((sections[1].start_line, sections[1].end_line), (5, 9));
        assert_eq!((sections[2].start_line, sections[2].end_line), (10, 11));
        assert_eq!((sections[3].start_line, sections[3].end_line), (12, 13));
    }

    #[test]
    fn trims_body_and_keeps_inner_lines() {
        let sections = extract_sections(DOC);
        assert_eq!(sections[1].content, "blue #3b82f6\ngreen #22c55e");
        assert_eq!(sections[1].slug, "brand-colors");
    }

    #[test]
    fn strips_closing_markers() {
        let sections = extract_sections(DOC);
        assert_eq!(sections[3].title, "Headings");
        assert_eq!(sections[3].heading, "### Headings ###");
    }

    #[test]
    fn no_headings_means_no_sections() {
        assert!(extract_sections("just text\nmore text\n").is_empty());
        assert!(extract_sections("").is_empty());
    }

    #[test]
    fn preamble_is_not_a_section() {
        let sections = extract_sections("preface\n# One\nbody");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].start_line, 2);
        assert_eq!(sections[0].content, "body");
    }

    #[test]
    fn marker_without_space_is_body() {
        let sections = extract_sections("# Tags\n#hashtag\n####### seven");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, "#hashtag\n####### seven");
    }

    #[test]
    fn headings_inside_fences_are_ignored() {
        let doc = "# Shell\n```sh\n# not a heading\n```\n## Next\n";
        let sections = extract_sections(doc);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].content, "```sh\n# not a heading\n```");
    }

    #[test]
    fn fences_can_be_disabled() {
        let extractor = SectionExtractor::new(ExtractorConfig {
            respect_code_fences: false,
            ..ExtractorConfig::default()
        });
        let doc = "# Shell\n```sh\n# not a heading\n```\n";
        assert_eq!(extractor.extract(doc).len(), 2);
    }

    #[test]
    fn max_level_demotes_deep_headings() {
        let extractor = SectionExtractor::new(ExtractorConfig {
            max_level: 2,
            ..ExtractorConfig::default()
        });
        let sections = extractor.extract("# A\n### deep\n## B\n");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].content, "### deep");
    }

    #[test]
    fn duplicate_titles_get_suffixed_slugs() {
        let sections = extract_sections("# Usage\na\n# Usage\nb\n## Usage\nc");
        let slugs: Vec<&str> = sections.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs, vec!["usage", "usage-2", "usage-3"]);
    }

    #[test]
    fn ids_follow_document_order() {
        let sections = extract_sections(DOC);
        for (idx, section) in sections.iter().enumerate() {
            assert_eq!(section.id, SectionId(idx));
        }
    }

    #[test]
    fn handles_crlf_input() {
        let sections = extract_sections("# One\r\nbody\r\n## Two\r\n");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "One");
        assert_eq!(sections[0].content, "body");
    }
}
