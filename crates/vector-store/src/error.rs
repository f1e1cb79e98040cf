use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VectorStoreError {
    #[error("Vectorizer is not initialized")]
    NotReady,

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Corrupted snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("Stale snapshot: generation {offered} is not newer than live generation {current}")]
    StaleGeneration { current: u64, offered: u64 },

    #[error("Invalid vectorizer configuration: {0}")]
    InvalidConfig(String),
}
