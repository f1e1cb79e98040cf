//! # Docsearch Indexer
//!
//! Keeps the search index in step with a changing document.
//!
//! ## Pipeline
//!
//! ```text
//! change notification (FileWatcher / caller)
//!     │
//!     ├──> debounce (coalesce bursts)
//!     │
//!     ├──> DocumentSource::fetch_text
//!     │      └─> Section Extractor
//!     │
//!     └──> IndexStore::rebuild (blocking pool)
//!            └─> atomic snapshot swap + IndexUpdate broadcast
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use docsearch_indexer::{CoordinatorConfig, FileDocumentSource, ReindexCoordinator};
//! use docsearch_vector_store::{HashingEmbedder, IndexStore, VectorizerConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let embedder = HashingEmbedder::ready(VectorizerConfig::default())?;
//!     let store = Arc::new(IndexStore::new(Arc::new(embedder)));
//!     let source = Arc::new(FileDocumentSource::new("guide.md"));
//!
//!     let coordinator = ReindexCoordinator::start(source, store, CoordinatorConfig::default())?;
//!     let update = coordinator.refresh().await?;
//!     println!("Indexed {} sections", update.sections);
//!     Ok(())
//! }
//! ```

mod coordinator;
mod error;
mod file_watcher;
mod source;

pub use coordinator::{
    CoordinatorConfig, CoordinatorHealth, CoordinatorState, IndexUpdate, ReindexCoordinator,
};
pub use error::{IndexerError, Result};
pub use file_watcher::FileWatcher;
pub use source::{DocumentSource, FileDocumentSource, MemoryDocumentSource};
