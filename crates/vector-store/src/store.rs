use crate::embeddings::Embedder;
use crate::error::{Result, VectorStoreError};
use crate::snapshot::{section_text, IndexSnapshot, IndexedSection, SnapshotStats};
use arc_swap::ArcSwap;
use docsearch_sections::Section;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Holds the live index snapshot.
///
/// Readers load the current snapshot without locking; the single writer
/// builds a complete replacement off to the side and publishes it with one
/// atomic pointer swap.
pub struct IndexStore {
    embedder: Arc<dyn Embedder>,
    live: ArcSwap<IndexSnapshot>,
    next_generation: AtomicU64,
}

impl IndexStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        let dimension = embedder.dimension();
        Self {
            embedder,
            live: ArcSwap::from_pointee(IndexSnapshot::empty(dimension)),
            next_generation: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Vectorize `sections` into a new snapshot without publishing it.
    ///
    /// If the vectorizer is not ready the snapshot carries no vectors and
    /// vector search skips it.
    pub fn build(&self, sections: Vec<Section>) -> Result<IndexSnapshot> {
        let dimension = self.embedder.dimension();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let vectors: Vec<Option<Vec<f32>>> = if self.embedder.is_ready() {
            let texts: Vec<String> = sections.iter().map(section_text).collect();
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            let vectors = self.embedder.embed_batch(&refs)?;
            if vectors.len() != sections.len() {
                return Err(VectorStoreError::CorruptSnapshot(format!(
                    "embedded {} vectors for {} sections",
                    vectors.len(),
                    sections.len()
                )));
            }
            for vector in &vectors {
                if vector.len() != dimension {
                    return Err(VectorStoreError::InvalidDimension {
                        expected: dimension,
                        actual: vector.len(),
                    });
                }
            }
            vectors.into_iter().map(Some).collect()
        } else {
            log::warn!(
                "Vectorizer not ready; building generation {generation} without vectors"
            );
            vec![None; sections.len()]
        };

        let entries: Vec<IndexedSection> = sections
            .into_iter()
            .zip(vectors)
            .map(|(section, vector)| IndexedSection { section, vector })
            .collect();

        let snapshot = IndexSnapshot::new(generation, dimension, entries);
        snapshot.verify()?;

        log::debug!(
            "Built snapshot generation {} ({} sections, vectorized={})",
            generation,
            snapshot.len(),
            snapshot.is_vectorized()
        );
        Ok(snapshot)
    }

    /// The live snapshot. Holding the `Arc` pins that version for the
    /// caller even if a newer one is published meanwhile.
    #[must_use]
    pub fn current(&self) -> Arc<IndexSnapshot> {
        self.live.load_full()
    }

    /// Atomically replace the live snapshot, returning the previous one.
    ///
    /// A snapshot whose generation is not newer than the live one is
    /// rejected and the live snapshot is left untouched.
    pub fn swap(&self, snapshot: IndexSnapshot) -> Result<Arc<IndexSnapshot>> {
        let next = Arc::new(snapshot);
        let previous = self.live.rcu(|current| {
            if next.generation() > current.generation() {
                Arc::clone(&next)
            } else {
                Arc::clone(current)
            }
        });

        if previous.generation() >= next.generation() {
            return Err(VectorStoreError::StaleGeneration {
                current: previous.generation(),
                offered: next.generation(),
            });
        }

        log::debug!(
            "Swapped snapshot generation {} -> {}",
            previous.generation(),
            next.generation()
        );
        Ok(previous)
    }

    /// Build and publish in one step
    pub fn rebuild(&self, sections: Vec<Section>) -> Result<SnapshotStats> {
        let snapshot = self.build(sections)?;
        let stats = snapshot.stats();
        self.swap(snapshot)?;
        Ok(stats)
    }

    #[must_use]
    pub fn stats(&self) -> SnapshotStats {
        self.live.load().stats()
    }
}
