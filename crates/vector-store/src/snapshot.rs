use crate::error::{Result, VectorStoreError};
use docsearch_sections::{validate_sections, Section, SectionId};
use serde::Serialize;

/// A section paired with its vector
#[derive(Debug, Clone)]
pub struct IndexedSection {
    pub section: Section,

    /// `None` when the vectorizer was not ready at build time
    pub vector: Option<Vec<f32>>,
}

/// One immutable, fully built version of the search index.
///
/// Never patched; the store replaces it wholesale.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    generation: u64,
    dimension: usize,
    entries: Vec<IndexedSection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnapshotStats {
    pub generation: u64,
    pub sections: usize,
    pub vectorized: bool,
}

impl IndexSnapshot {
    #[must_use]
    pub const fn empty(dimension: usize) -> Self {
        Self {
            generation: 0,
            dimension,
            entries: Vec::new(),
        }
    }

    pub(crate) fn new(generation: u64, dimension: usize, entries: Vec<IndexedSection>) -> Self {
        Self {
            generation,
            dimension,
            entries,
        }
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn entries(&self) -> &[IndexedSection] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when the entries carry vectors
    #[must_use]
    pub fn is_vectorized(&self) -> bool {
        self.entries.first().is_some_and(|e| e.vector.is_some())
    }

    #[must_use]
    pub fn get(&self, id: SectionId) -> Option<&IndexedSection> {
        self.entries
            .get(id.ordinal())
            .filter(|entry| entry.section.id == id)
            .or_else(|| self.entries.iter().find(|entry| entry.section.id == id))
    }

    #[must_use]
    pub fn stats(&self) -> SnapshotStats {
        SnapshotStats {
            generation: self.generation,
            sections: self.entries.len(),
            vectorized: self.is_vectorized(),
        }
    }

    /// Check slug uniqueness, section structure and uniform dimensionality.
    pub fn verify(&self) -> Result<()> {
        validate_sections(self.entries.iter().map(|e| &e.section))
            .map_err(|err| VectorStoreError::CorruptSnapshot(err.to_string()))?;

        let vectorized = self.is_vectorized();
        for entry in &self.entries {
            match &entry.vector {
                Some(vector) if vector.len() != self.dimension => {
                    return Err(VectorStoreError::InvalidDimension {
                        expected: self.dimension,
                        actual: vector.len(),
                    });
                }
                Some(_) if !vectorized => {
                    return Err(VectorStoreError::CorruptSnapshot(format!(
                        "section '{}' has a vector in an unvectorized snapshot",
                        entry.section.slug
                    )));
                }
                None if vectorized => {
                    return Err(VectorStoreError::CorruptSnapshot(format!(
                        "section '{}' is missing its vector",
                        entry.section.slug
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Text a section is vectorized from
#[must_use]
pub fn section_text(section: &Section) -> String {
    format!("{}\n{}", section.title, section.content)
}
