use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Vector store error: {0}")]
    VectorStore(#[from] docsearch_vector_store::VectorStoreError),

    #[error("Limit {limit} is out of range (expected 1..={max})")]
    InvalidLimit { limit: usize, max: usize },

    #[error("Query is {chars} characters long (max {max})")]
    QueryTooLong { chars: usize, max: usize },

    #[error("Invalid search configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Config is not valid TOML: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Search configuration lock poisoned")]
    LockPoisoned,
}

impl SearchError {
    /// True for errors caused by caller input rather than index state
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidLimit { .. } | Self::QueryTooLong { .. } | Self::InvalidConfig(_)
        )
    }
}
