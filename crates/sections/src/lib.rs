//! # Docsearch Sections
//!
//! Splits a heading-structured document into an ordered list of sections.
//!
//! ## Pipeline
//!
//! ```text
//! Raw text
//!     │
//!     ├──> Line scan (fence aware)
//!     │      └─> heading lines open sections, other lines accumulate
//!     │
//!     ├──> Slug assignment
//!     │      └─> unique, URL-safe, numeric suffix on collision
//!     │
//!     └──> Section[] (+ optional TOC tree)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use docsearch_sections::{build_toc, extract_sections};
//!
//! let doc = "# Guide\nintro\n## Brand Colors\nblue #3b82f6\n";
//! let sections = extract_sections(doc);
//! assert_eq!(sections.len(), 2);
//! assert_eq!(sections[1].slug, "brand-colors");
//!
//! let toc = build_toc(&sections);
//! assert_eq!(toc[0].children[0].title, "Brand Colors");
//! ```

mod error;
mod extractor;
mod slug;
mod toc;
mod types;

pub use error::{Result, SectionError};
pub use extractor::{extract_sections, ExtractorConfig, SectionExtractor};
pub use slug::{slugify, SlugRegistry};
pub use toc::{build_toc, parent_indices, TocNode};
pub use types::{reconstruct, validate_sections, Section, SectionId, MAX_HEADING_LEVEL};
