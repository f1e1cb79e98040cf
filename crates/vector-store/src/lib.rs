//! # Docsearch Vector Store
//!
//! Deterministic text vectors and the immutable index snapshots search runs on.
//!
//! ## Architecture
//!
//! ```text
//! Section[]
//!     │
//!     ├──> HashingEmbedder (feature hashing, no model)
//!     │      └─> Vector[dimension], L2-normalized
//!     │
//!     ├──> IndexSnapshot (immutable, verified)
//!     │
//!     └──> IndexStore
//!            └─> ArcSwap pointer, one live snapshot
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use docsearch_sections::extract_sections;
//! use docsearch_vector_store::{HashingEmbedder, IndexStore, VectorizerConfig};
//!
//! let embedder = HashingEmbedder::ready(VectorizerConfig::default()).unwrap();
//! let store = IndexStore::new(Arc::new(embedder));
//!
//! let stats = store.rebuild(extract_sections("# Colors\nblue\n# Fonts\nInter")).unwrap();
//! assert_eq!(stats.sections, 2);
//! assert_eq!(store.current().len(), 2);
//! ```

mod embeddings;
mod error;
mod snapshot;
mod store;

pub use embeddings::{cosine_similarity, tokenize, Embedder, HashingEmbedder, VectorizerConfig};
pub use error::{Result, VectorStoreError};
pub use snapshot::{section_text, IndexSnapshot, IndexedSection, SnapshotStats};
pub use store::IndexStore;
