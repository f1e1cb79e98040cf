use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Failed to read {}: {source}", path.display())]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Document source error: {0}")]
    Source(String),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] docsearch_vector_store::VectorStoreError),

    #[error("Rebuild task failed: {0}")]
    RebuildTask(String),

    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),

    #[error("Invalid coordinator configuration: {0}")]
    InvalidConfig(String),

    #[error("Reindex coordinator has shut down")]
    ShutDown,
}
