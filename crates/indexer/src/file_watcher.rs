use crate::coordinator::ReindexCoordinator;
use crate::error::{IndexerError, Result};
use log::{debug, warn};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const FILE_EVENT_REASON: &str = "file_modified";

/// Forwards modifications of one file to a [`ReindexCoordinator`].
///
/// The parent directory is watched rather than the file itself, so editors
/// that save by writing a temp file and renaming it are still seen.
pub struct FileWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
    forward: JoinHandle<()>,
}

impl FileWatcher {
    /// Must be called from within a tokio runtime.
    pub fn start(path: impl Into<PathBuf>, coordinator: ReindexCoordinator) -> Result<Self> {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| {
                IndexerError::InvalidConfig(format!("{} is not a file path", path.display()))
            })?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, mut event_rx) = mpsc::channel::<notify::Result<Event>>(256);
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = event_tx.blocking_send(res);
            },
            NotifyConfig::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        debug!("Watching {} for changes to {:?}", dir.display(), file_name);

        let forward = tokio::spawn(async move {
            while let Some(res) = event_rx.recv().await {
                match res {
                    Ok(event) if is_relevant(&event, &file_name) => {
                        if coordinator.notify_changed(FILE_EVENT_REASON).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(err) => warn!("File watcher error: {err}"),
                }
            }
        });

        Ok(Self {
            path,
            _watcher: watcher,
            forward,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.forward.abort();
    }
}

fn is_relevant(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(file_name.as_os_str()))
}
