use thiserror::Error;

/// Result type for section operations
pub type Result<T> = std::result::Result<T, SectionError>;

/// Errors raised when a section set violates its structural invariants
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    /// Heading level outside 1..=6
    #[error("Invalid heading level {level} for section '{title}'")]
    InvalidLevel { title: String, level: u8 },

    /// Two sections in one set share a slug
    #[error("Duplicate slug '{0}'")]
    DuplicateSlug(String),

    /// Two sections in one set share an identifier
    #[error("Duplicate section id '{0}'")]
    DuplicateId(String),

    /// Line range is inverted
    #[error("Invalid line range for section '{title}': start={start}, end={end}")]
    InvalidLines {
        title: String,
        start: usize,
        end: usize,
    },
}
