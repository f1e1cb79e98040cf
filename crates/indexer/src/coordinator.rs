use crate::error::{IndexerError, Result};
use crate::source::DocumentSource;
use docsearch_sections::{extract_sections, Section};
use docsearch_vector_store::{IndexStore, SnapshotStats};
use log::{debug, error, info};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time;

const DEFAULT_REASON: &str = "document_changed";
const REFRESH_REASON: &str = "refresh";
const REPLACE_REASON: &str = "update_sections";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Quiet period after the last notification before rebuilding
    pub debounce: Duration,

    /// Longest a burst of notifications can postpone a rebuild
    pub max_batch_wait: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            max_batch_wait: Duration::from_secs(1),
        }
    }
}

impl CoordinatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_wait < self.debounce {
            return Err(IndexerError::InvalidConfig(format!(
                "max_batch_wait ({:?}) must not be shorter than debounce ({:?})",
                self.max_batch_wait, self.debounce
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorState {
    Idle,
    Rebuilding,
}

/// Outcome of one rebuild, broadcast to subscribers
#[derive(Debug, Clone, Serialize)]
pub struct IndexUpdate {
    /// Generation published by this rebuild; `None` when it failed
    pub generation: Option<u64>,
    pub sections: usize,
    pub duration_ms: u64,
    pub success: bool,
    pub error: Option<String>,
    pub reason: String,
    pub completed_at: SystemTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorHealth {
    pub state: CoordinatorState,
    pub last_success: Option<SystemTime>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub last_duration_ms: Option<u64>,

    /// Notifications received since the last rebuild started
    pub pending_events: usize,

    /// Generation of the live snapshot
    pub generation: u64,

    /// Completed rebuilds, successful or not
    pub rebuilds: u64,
}

impl CoordinatorHealth {
    const fn initial(generation: u64) -> Self {
        Self {
            state: CoordinatorState::Idle,
            last_success: None,
            last_error: None,
            consecutive_failures: 0,
            last_duration_ms: None,
            pending_events: 0,
            generation,
            rebuilds: 0,
        }
    }
}

/// Drives index rebuilds from change notifications.
///
/// One background task owns the Idle/Rebuilding state machine. Rebuilds
/// never overlap: notifications arriving during a rebuild collapse into a
/// single follow-up rebuild once it finishes.
#[derive(Clone)]
pub struct ReindexCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    command_tx: mpsc::Sender<Command>,
    update_tx: broadcast::Sender<IndexUpdate>,
    health_tx: watch::Sender<CoordinatorHealth>,
    store: Arc<IndexStore>,
}

enum Command {
    Changed {
        reason: String,
    },
    Refresh {
        reply: oneshot::Sender<IndexUpdate>,
    },
    Replace {
        sections: Vec<Section>,
        reply: oneshot::Sender<IndexUpdate>,
    },
    Shutdown,
}

impl ReindexCoordinator {
    /// Spawn the coordinator loop on the current tokio runtime.
    ///
    /// Nothing is built until the first notification or [`refresh`](Self::refresh).
    pub fn start(
        source: Arc<dyn DocumentSource>,
        store: Arc<IndexStore>,
        config: CoordinatorConfig,
    ) -> Result<Self> {
        config.validate()?;

        let (command_tx, command_rx) = mpsc::channel(64);
        let (update_tx, _) = broadcast::channel(32);
        let (health_tx, _) =
            watch::channel(CoordinatorHealth::initial(store.current().generation()));

        info!(
            "Starting reindex coordinator for {} (debounce {:?})",
            source.describe(),
            config.debounce
        );

        spawn_coordinator_loop(
            source,
            Arc::clone(&store),
            config,
            command_rx,
            update_tx.clone(),
            health_tx.clone(),
        );

        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                command_tx,
                update_tx,
                health_tx,
                store,
            }),
        })
    }

    /// Report that the document changed. Returns once the notification is
    /// queued; the rebuild happens after the debounce window.
    pub async fn notify_changed(&self, reason: impl Into<String>) -> Result<()> {
        self.send(Command::Changed {
            reason: reason.into(),
        })
        .await
    }

    /// Rebuild from the source without debouncing and wait for the result.
    pub async fn refresh(&self) -> Result<IndexUpdate> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Refresh { reply }).await?;
        rx.await.map_err(|_| IndexerError::ShutDown)
    }

    /// Rebuild from sections the caller already holds and wait for the
    /// result.
    ///
    /// If a rebuild is running, the sections are queued for the follow-up
    /// rebuild; a later call replaces them and every waiting caller gets the
    /// outcome of that one rebuild. Source changes reported after the
    /// sections were queued are fetched by one more rebuild afterwards.
    pub async fn update_sections(&self, sections: Vec<Section>) -> Result<IndexUpdate> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Replace { sections, reply }).await?;
        rx.await.map_err(|_| IndexerError::ShutDown)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    #[must_use]
    pub fn store(&self) -> &Arc<IndexStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn subscribe_updates(&self) -> broadcast::Receiver<IndexUpdate> {
        self.inner.update_tx.subscribe()
    }

    #[must_use]
    pub fn health(&self) -> CoordinatorHealth {
        self.inner.health_tx.borrow().clone()
    }

    #[must_use]
    pub fn health_stream(&self) -> watch::Receiver<CoordinatorHealth> {
        self.inner.health_tx.subscribe()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.inner
            .command_tx
            .send(command)
            .await
            .map_err(|_| IndexerError::ShutDown)
    }
}

enum RebuildInput {
    Text(String),
    Sections(Vec<Section>),
}

impl RebuildInput {
    fn into_sections(self) -> Vec<Section> {
        match self {
            Self::Text(text) => extract_sections(&text),
            Self::Sections(sections) => sections,
        }
    }
}

/// Source work requested after a set of caller-held sections was queued
#[derive(Default)]
struct Refetch {
    reason: Option<String>,
    waiters: Vec<oneshot::Sender<IndexUpdate>>,
}

impl Refetch {
    fn record(&mut self, reason: &str) {
        if self.reason.as_deref() != Some(REFRESH_REASON) {
            self.reason = Some(reason.to_string());
        }
    }
}

struct InFlight {
    handle: JoinHandle<Result<SnapshotStats>>,
    reason: String,
    started: Instant,
    waiters: Vec<oneshot::Sender<IndexUpdate>>,
}

fn spawn_coordinator_loop(
    source: Arc<dyn DocumentSource>,
    store: Arc<IndexStore>,
    config: CoordinatorConfig,
    mut command_rx: mpsc::Receiver<Command>,
    update_tx: broadcast::Sender<IndexUpdate>,
    health_tx: watch::Sender<CoordinatorHealth>,
) {
    tokio::spawn(async move {
        let mut state = DebounceState::new(config.debounce, config.max_batch_wait);
        let mut health = CoordinatorHealth::initial(store.current().generation());
        let mut in_flight: Option<InFlight> = None;
        let mut queued_sections: Option<Vec<Section>> = None;
        let mut waiters: Vec<oneshot::Sender<IndexUpdate>> = Vec::new();
        let mut refetch = Refetch::default();

        loop {
            let next_deadline = state.next_deadline();

            tokio::select! {
                command = command_rx.recv() => {
                    match command {
                        Some(Command::Changed { reason }) => {
                            if queued_sections.is_some() {
                                refetch.record(&reason);
                            }
                            state.record_event(&reason);
                        }
                        Some(Command::Refresh { reply }) => {
                            if queued_sections.is_some() {
                                refetch.record(REFRESH_REASON);
                                refetch.waiters.push(reply);
                            } else {
                                waiters.push(reply);
                            }
                            state.force_run(REFRESH_REASON);
                        }
                        Some(Command::Replace { sections, reply }) => {
                            if queued_sections.replace(sections).is_some() {
                                debug!("Replacing queued sections with a newer set");
                            }
                            waiters.append(&mut refetch.waiters);
                            refetch.reason = None;
                            state.force_run(REPLACE_REASON);
                            waiters.push(reply);
                        }
                        Some(Command::Shutdown) | None => break,
                    }
                    if in_flight.is_some() && state.pending() == 1 {
                        debug!("Rebuild in progress; scheduling one follow-up rebuild");
                    }
                    health.pending_events = state.pending();
                    health_tx.send_replace(health.clone());
                }
                joined = join_in_flight(&mut in_flight) => {
                    if let Some(finished) = in_flight.take() {
                        let update = finish_rebuild(finished, joined, &store, &mut health);
                        health.pending_events = state.pending();
                        health_tx.send_replace(health.clone());
                        let _ = update_tx.send(update);
                    }
                }
                () = async {
                    if let Some(deadline) = next_deadline {
                        time::sleep_until(deadline).await;
                    }
                }, if in_flight.is_none() && state.should_run() && next_deadline.is_some() => {
                    let sections = queued_sections.take();
                    let reason = match sections {
                        Some(_) => REPLACE_REASON.to_string(),
                        None => state
                            .take_reason()
                            .unwrap_or_else(|| DEFAULT_REASON.to_string()),
                    };
                    let coalesced = state.pending();
                    state.reset();

                    // Source changes that arrived after the queued sections
                    // still need a fetch once those sections are published.
                    if sections.is_some() {
                        if let Some(follow_up) = refetch.reason.take() {
                            if follow_up == REFRESH_REASON {
                                state.force_run(&follow_up);
                            } else {
                                state.record_event(&follow_up);
                            }
                            debug!("Source changed behind queued sections; fetching again afterwards");
                        }
                    }

                    info!("Rebuilding index ({reason}, {coalesced} coalesced events)");
                    health.state = CoordinatorState::Rebuilding;
                    health.pending_events = state.pending();
                    health_tx.send_replace(health.clone());

                    in_flight = Some(InFlight {
                        handle: spawn_rebuild(Arc::clone(&source), Arc::clone(&store), sections),
                        reason,
                        started: Instant::now(),
                        waiters: std::mem::take(&mut waiters),
                    });
                    waiters.append(&mut refetch.waiters);
                }
            }
        }

        debug!("Reindex coordinator loop stopped");
    });
}

async fn join_in_flight(
    in_flight: &mut Option<InFlight>,
) -> std::result::Result<Result<SnapshotStats>, tokio::task::JoinError> {
    match in_flight {
        Some(job) => (&mut job.handle).await,
        None => std::future::pending().await,
    }
}

/// Fetch, extract and vectorize off the async workers, then publish.
///
/// Caller-held sections skip the source entirely.
fn spawn_rebuild(
    source: Arc<dyn DocumentSource>,
    store: Arc<IndexStore>,
    sections: Option<Vec<Section>>,
) -> JoinHandle<Result<SnapshotStats>> {
    tokio::spawn(async move {
        let input = match sections {
            Some(sections) => RebuildInput::Sections(sections),
            None => RebuildInput::Text(source.fetch_text().await?),
        };

        tokio::task::spawn_blocking(move || {
            store
                .rebuild(input.into_sections())
                .map_err(IndexerError::from)
        })
        .await
        .map_err(|err| IndexerError::RebuildTask(err.to_string()))?
    })
}

fn finish_rebuild(
    finished: InFlight,
    joined: std::result::Result<Result<SnapshotStats>, tokio::task::JoinError>,
    store: &IndexStore,
    health: &mut CoordinatorHealth,
) -> IndexUpdate {
    let duration_ms = u64::try_from(finished.started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let outcome = joined.unwrap_or_else(|err| Err(IndexerError::RebuildTask(err.to_string())));

    health.state = CoordinatorState::Idle;
    health.rebuilds += 1;
    health.last_duration_ms = Some(duration_ms);
    health.generation = store.current().generation();

    let update = match outcome {
        Ok(stats) => {
            info!(
                "Index rebuilt: generation {} with {} sections in {}ms ({})",
                stats.generation, stats.sections, duration_ms, finished.reason
            );
            health.last_success = Some(SystemTime::now());
            health.last_error = None;
            health.consecutive_failures = 0;
            IndexUpdate {
                generation: Some(stats.generation),
                sections: stats.sections,
                duration_ms,
                success: true,
                error: None,
                reason: finished.reason,
                completed_at: SystemTime::now(),
            }
        }
        Err(err) => {
            error!(
                "Index rebuild failed ({}); keeping generation {}: {err}",
                finished.reason, health.generation
            );
            let message = err.to_string();
            health.last_error = Some(message.clone());
            health.consecutive_failures += 1;
            IndexUpdate {
                generation: None,
                sections: 0,
                duration_ms,
                success: false,
                error: Some(message),
                reason: finished.reason,
                completed_at: SystemTime::now(),
            }
        }
    };

    for waiter in finished.waiters {
        let _ = waiter.send(update.clone());
    }
    update
}

struct DebounceState {
    debounce: Duration,
    max_batch: Duration,
    dirty: bool,
    pending: usize,
    last_event: Option<Instant>,
    first_event: Option<Instant>,
    reason: Option<String>,
    force_immediate: bool,
}

impl DebounceState {
    const fn new(debounce: Duration, max_batch: Duration) -> Self {
        Self {
            debounce,
            max_batch,
            dirty: false,
            pending: 0,
            last_event: None,
            first_event: None,
            reason: None,
            force_immediate: false,
        }
    }

    fn record_event(&mut self, reason: &str) {
        let now = Instant::now();
        self.pending += 1;
        self.reason = Some(reason.to_string());
        self.last_event = Some(now);
        self.first_event.get_or_insert(now);
        self.dirty = true;
    }

    fn force_run(&mut self, reason: &str) {
        self.pending += 1;
        self.reason = Some(reason.to_string());
        self.force_immediate = true;
        self.dirty = true;
    }

    const fn pending(&self) -> usize {
        self.pending
    }

    const fn should_run(&self) -> bool {
        self.dirty
    }

    fn next_deadline(&self) -> Option<time::Instant> {
        if !self.dirty {
            return None;
        }

        if self.force_immediate {
            return Some(time::Instant::now());
        }

        let quiet = self.last_event.map(|last| last + self.debounce);
        let forced = self.first_event.map(|first| first + self.max_batch);
        let deadline = match (quiet, forced) {
            (Some(quiet), Some(forced)) => Some(quiet.min(forced)),
            (quiet, forced) => quiet.or(forced),
        };

        deadline.map(time::Instant::from_std)
    }

    fn take_reason(&mut self) -> Option<String> {
        self.reason.take()
    }

    fn reset(&mut self) {
        self.dirty = false;
        self.pending = 0;
        self.last_event = None;
        self.first_event = None;
        self.reason = None;
        self.force_immediate = false;
    }

    #[cfg(test)]
    const fn force_flag(&self) -> bool {
        self.force_immediate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryDocumentSource;
    use async_trait::async_trait;
    use docsearch_vector_store::{HashingEmbedder, VectorizerConfig};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn debounce_generates_deadline() {
        let mut state = DebounceState::new(Duration::from_millis(100), Duration::from_secs(1));
        assert!(state.next_deadline().is_none());
        state.record_event("changed");
        assert!(state.should_run());
        assert!(state.next_deadline().is_some());
        assert_eq!(state.pending(), 1);
    }

    #[test]
    fn force_run_sets_immediate_deadline() {
        let mut state = DebounceState::new(Duration::from_secs(5), Duration::from_secs(10));
        state.force_run("manual");
        assert!(state.should_run());
        assert!(state.force_flag());
        let deadline = state.next_deadline().unwrap();
        assert!(deadline <= time::Instant::now());
    }

    #[test]
    fn max_batch_caps_the_debounce() {
        let mut state = DebounceState::new(Duration::from_secs(10), Duration::from_millis(50));
        state.record_event("changed");
        let deadline = state.next_deadline().unwrap();
        assert!(deadline <= time::Instant::now() + Duration::from_millis(60));
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = DebounceState::new(Duration::from_millis(100), Duration::from_secs(1));
        state.record_event("a");
        state.force_run("b");
        assert_eq!(state.take_reason().as_deref(), Some("b"));
        state.reset();
        assert!(!state.should_run());
        assert!(!state.force_flag());
        assert_eq!(state.pending(), 0);
        assert!(state.next_deadline().is_none());
    }

    #[test]
    fn config_rejects_short_batch_wait() {
        let config = CoordinatorConfig {
            debounce: Duration::from_millis(500),
            max_batch_wait: Duration::from_millis(100),
        };
        assert!(matches!(
            config.validate(),
            Err(IndexerError::InvalidConfig(_))
        ));
        assert!(CoordinatorConfig::default().validate().is_ok());
    }

    struct CountingSource {
        text: String,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl DocumentSource for CountingSource {
        async fn fetch_text(&self) -> Result<String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    fn store() -> Arc<IndexStore> {
        let embedder = HashingEmbedder::ready(VectorizerConfig::default()).unwrap();
        Arc::new(IndexStore::new(Arc::new(embedder)))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn refresh_publishes_a_snapshot() {
        let store = store();
        let source = Arc::new(MemoryDocumentSource::new("# A\nalpha\n# B\nbeta"));
        let coordinator =
            ReindexCoordinator::start(source, Arc::clone(&store), CoordinatorConfig::default())
                .unwrap();

        let update = coordinator.refresh().await.unwrap();
        assert!(update.success);
        assert_eq!(update.sections, 2);
        assert_eq!(update.reason, REFRESH_REASON);
        assert_eq!(update.generation, Some(store.current().generation()));

        let health = coordinator.health();
        assert_eq!(health.state, CoordinatorState::Idle);
        assert_eq!(health.rebuilds, 1);
        assert_eq!(health.generation, store.current().generation());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn burst_of_notifications_rebuilds_once() {
        let source = Arc::new(CountingSource {
            text: "# A\nalpha".to_string(),
            fetches: AtomicUsize::new(0),
        });
        let config = CoordinatorConfig {
            debounce: Duration::from_millis(50),
            max_batch_wait: Duration::from_secs(2),
        };
        let coordinator =
            ReindexCoordinator::start(source.clone() as Arc<dyn DocumentSource>, store(), config)
                .unwrap();
        let mut updates = coordinator.subscribe_updates();

        for i in 0..10 {
            coordinator.notify_changed(format!("edit-{i}")).await.unwrap();
        }

        let update = time::timeout(Duration::from_secs(2), updates.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(update.success);
        assert_eq!(update.reason, "edit-9");

        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn shutdown_stops_accepting_work() {
        let coordinator = ReindexCoordinator::start(
            Arc::new(MemoryDocumentSource::new("# A")),
            store(),
            CoordinatorConfig::default(),
        )
        .unwrap();
        coordinator.shutdown().await.unwrap();
        time::sleep(Duration::from_millis(50)).await;

        let err = coordinator.refresh().await.unwrap_err();
        assert!(matches!(err, IndexerError::ShutDown));
    }
}
