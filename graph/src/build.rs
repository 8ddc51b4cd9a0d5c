//! Running history builds off the caller's thread.
//!
//! Every build constructs a fresh [`CommitHistory`] and only a finished one
//! is published, so readers never observe a partially built history.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::HistoryConfig;
use crate::core::{Commit, CommitHistory};
use crate::error::{GraphError, Result};

/// A completed, published history
pub type Snapshot = Arc<CommitHistory>;

/// Cooperative cancellation flag shared between a build and whoever
/// requested it.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress of a build, reported after each head is processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildProgress {
    pub heads_done: usize,
    pub heads_total: usize,
    /// Entries in the history so far
    pub commits: usize,
}

/// Build a history from the given heads, in order.
///
/// Cancellation is checked before each head; a single head's traversal is
/// never interrupted.
pub fn build_history(
    heads: &[Commit],
    config: &HistoryConfig,
    cancel: &Cancellation,
) -> Result<CommitHistory> {
    build_history_with_progress(heads, config, cancel, |_| {})
}

/// Same as [`build_history`], calling `on_progress` after every head.
pub fn build_history_with_progress(
    heads: &[Commit],
    config: &HistoryConfig,
    cancel: &Cancellation,
    mut on_progress: impl FnMut(BuildProgress),
) -> Result<CommitHistory> {
    let mut history = CommitHistory::with_config(config.clone());

    for (index, head) in heads.iter().enumerate() {
        if cancel.is_cancelled() {
            debug!("build cancelled after {} commits", history.len());
            return Err(GraphError::BuildAborted);
        }
        history.process(head, None);

        let progress = BuildProgress {
            heads_done: index + 1,
            heads_total: heads.len(),
            commits: history.len(),
        };
        debug!(
            "processed head {} ({}/{}), {} commits",
            head, progress.heads_done, progress.heads_total, progress.commits
        );
        on_progress(progress);
    }

    debug!("built history of {} commits from {} heads", history.len(), heads.len());
    Ok(history)
}

/// Serialised history builder that publishes snapshots.
///
/// Builds run one at a time on the blocking pool. A new request cancels the
/// one before it, and a cancelled build never publishes.
pub struct BuildWorker {
    config: HistoryConfig,
    serial: Arc<Mutex<()>>,
    current: StdMutex<Cancellation>,
    published: Arc<watch::Sender<Option<Snapshot>>>,
}

impl BuildWorker {
    pub fn new(config: HistoryConfig) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            config,
            serial: Arc::new(Mutex::new(())),
            current: StdMutex::new(Cancellation::new()),
            published: Arc::new(published),
        }
    }

    /// Latest published history, if any build has completed
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.published.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot>> {
        self.published.subscribe()
    }

    /// Cancel the most recently requested build
    pub fn cancel(&self) {
        self.swap_cancellation(Cancellation::new());
    }

    fn swap_cancellation(&self, next: Cancellation) {
        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        current.cancel();
        *current = next;
    }

    /// Queue a build from `heads`. Must be called inside a tokio runtime.
    ///
    /// The handle resolves to the published snapshot, or `None` if the build
    /// was superseded or cancelled.
    pub fn request(&self, heads: Vec<Commit>) -> JoinHandle<Result<Option<Snapshot>>> {
        self.request_with_progress(heads, |_| {})
    }

    /// Like [`BuildWorker::request`], reporting progress from the build
    /// thread.
    pub fn request_with_progress<F>(
        &self,
        heads: Vec<Commit>,
        on_progress: F,
    ) -> JoinHandle<Result<Option<Snapshot>>>
    where
        F: FnMut(BuildProgress) + Send + 'static,
    {
        let cancel = Cancellation::new();
        self.swap_cancellation(cancel.clone());

        let serial = Arc::clone(&self.serial);
        let published = Arc::clone(&self.published);
        let config = self.config.clone();

        tokio::spawn(async move {
            let _guard = serial.lock().await;
            if cancel.is_cancelled() {
                return Ok(None);
            }

            let build_cancel = cancel.clone();
            let built = tokio::task::spawn_blocking(move || {
                build_history_with_progress(&heads, &config, &build_cancel, on_progress)
            })
            .await?;

            let history = match built {
                Ok(history) => history,
                Err(GraphError::BuildAborted) => return Ok(None),
                Err(e) => return Err(e),
            };
            if cancel.is_cancelled() {
                return Ok(None);
            }

            let snapshot = Arc::new(history);
            info!("published history of {} commits", snapshot.len());
            published.send_replace(Some(Arc::clone(&snapshot)));
            Ok(Some(snapshot))
        })
    }
}

impl Default for BuildWorker {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}
