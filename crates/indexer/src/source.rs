use crate::error::{IndexerError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Where the coordinator fetches the current document text from
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch_text(&self) -> Result<String>;

    /// Human-readable name for logs
    fn describe(&self) -> String {
        "document".to_string()
    }
}

/// In-process document text
#[derive(Debug, Default)]
pub struct MemoryDocumentSource {
    text: RwLock<String>,
}

impl MemoryDocumentSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: RwLock::new(text.into()),
        }
    }

    /// Replace the text. Callers notify the coordinator afterwards.
    pub fn set_text(&self, text: impl Into<String>) -> Result<()> {
        let mut guard = self
            .text
            .write()
            .map_err(|_| IndexerError::Source("document text lock poisoned".to_string()))?;
        *guard = text.into();
        Ok(())
    }
}

#[async_trait]
impl DocumentSource for MemoryDocumentSource {
    async fn fetch_text(&self) -> Result<String> {
        self.text
            .read()
            .map(|text| text.clone())
            .map_err(|_| IndexerError::Source("document text lock poisoned".to_string()))
    }

    fn describe(&self) -> String {
        "in-memory document".to_string()
    }
}

/// A UTF-8 file on disk, re-read on every fetch
#[derive(Debug, Clone)]
pub struct FileDocumentSource {
    path: PathBuf,
}

impl FileDocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentSource for FileDocumentSource {
    async fn fetch_text(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| IndexerError::ReadDocument {
                path: self.path.clone(),
                source,
            })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn memory_source_returns_latest_text() {
        let source = MemoryDocumentSource::new("# One");
        assert_eq!(source.fetch_text().await.unwrap(), "# One");
        source.set_text("# Two").unwrap();
        assert_eq!(source.fetch_text().await.unwrap(), "# Two");
    }

    #[tokio::test]
    async fn file_source_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        tokio::fs::write(&path, "# Title\nbody").await.unwrap();

        let source = FileDocumentSource::new(&path);
        assert_eq!(source.fetch_text().await.unwrap(), "# Title\nbody");
        assert_eq!(source.describe(), path.display().to_string());
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileDocumentSource::new(dir.path().join("missing.md"));
        let err = source.fetch_text().await.unwrap_err();
        assert!(matches!(err, IndexerError::ReadDocument { .. }));
    }
}
