//! Background fetch runner
//!
//! Lookups are slow chains of network requests, so each one runs on its own
//! worker thread. The worker owns everything it touches: progress events go
//! back over a channel and the single outcome over a one-shot channel, both
//! read by the thread holding the handle. Every fetch gets an id; the runner
//! remembers the most recently started one so that outcomes of superseded
//! fetches can be dropped instead of overwriting newer results.

use crate::episodes::{FetchResult, ProgressEvent, try_fetch_all_episodes};
use crate::metadata_retrieval::{EpisodeCatalog, SearchQuery};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::thread;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

/// Identity of one fetch, unique per runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchId(u64);

impl fmt::Display for FetchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a fetch; `Completed` and `Failed` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FetchState {
    /// Started but the worker has not picked it up yet
    Idle = 0,
    Running = 1,
    Completed = 2,
    /// A request failed or the worker died; the result is empty
    Failed = 3,
}

impl FetchState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => FetchState::Idle,
            1 => FetchState::Running,
            2 => FetchState::Completed,
            _ => FetchState::Failed,
        }
    }

    fn store(self, cell: &AtomicU8) {
        cell.store(self as u8, Ordering::SeqCst);
    }
}

/// The single notification a fetch delivers
#[derive(Debug)]
pub struct FetchOutcome {
    pub id: FetchId,
    pub query: SearchQuery,
    /// Either `Completed` or `Failed`
    pub state: FetchState,
    /// Empty when the fetch failed
    pub result: FetchResult,
}

impl FetchOutcome {
    fn failed(id: FetchId, query: SearchQuery) -> Self {
        Self {
            id,
            query,
            state: FetchState::Failed,
            result: FetchResult::empty(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == FetchState::Failed
    }
}

/// Receiving end of one fetch
///
/// Progress events are read with [`FetchHandle::next_progress`] or
/// [`FetchHandle::try_next_progress`]. The outcome is handed out exactly once,
/// by either [`FetchHandle::wait`] or [`FetchHandle::try_take`].
#[derive(Debug)]
pub struct FetchHandle {
    id: FetchId,
    query: SearchQuery,
    progress: mpsc::UnboundedReceiver<ProgressEvent>,
    receiver: oneshot::Receiver<FetchOutcome>,
    state: Arc<AtomicU8>,
    delivered: bool,
}

impl FetchHandle {
    pub fn id(&self) -> FetchId {
        self.id
    }

    pub fn state(&self) -> FetchState {
        FetchState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Blocks until the next progress event arrives
    ///
    /// Returns `None` once the worker has finished and every event was read.
    /// Must not be called from within an async runtime.
    pub fn next_progress(&mut self) -> Option<ProgressEvent> {
        self.progress.blocking_recv()
    }

    /// Takes the next progress event if one is waiting, without blocking
    pub fn try_next_progress(&mut self) -> Option<ProgressEvent> {
        self.progress.try_recv().ok()
    }

    /// Blocks until the outcome arrives
    ///
    /// Returns `None` only if the outcome was already taken with
    /// [`FetchHandle::try_take`]. Must not be called from within an async
    /// runtime.
    pub fn wait(self) -> Option<FetchOutcome> {
        let FetchHandle {
            id,
            query,
            receiver,
            state,
            delivered,
            ..
        } = self;
        if delivered {
            return None;
        }

        match receiver.blocking_recv() {
            Ok(outcome) => Some(outcome),
            Err(_) => Some(worker_lost(id, &query, &state)),
        }
    }

    /// Takes the outcome if it has arrived, without blocking
    pub fn try_take(&mut self) -> Option<FetchOutcome> {
        if self.delivered {
            return None;
        }

        let outcome = match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => {
                worker_lost(self.id, &self.query, &self.state)
            }
        };
        self.delivered = true;
        Some(outcome)
    }
}

/// Outcome for a fetch whose worker dropped its sender without sending
fn worker_lost(id: FetchId, query: &SearchQuery, state: &AtomicU8) -> FetchOutcome {
    error!("Fetch {id} ended without delivering a result");
    FetchState::Failed.store(state);
    FetchOutcome::failed(id, query.clone())
}

/// Starts lookups on background threads and tracks which one is current
pub struct FetchRunner<C: ?Sized> {
    catalog: Arc<C>,
    next_id: AtomicU64,
    active: AtomicU64,
}

impl<C> FetchRunner<C>
where
    C: EpisodeCatalog + Send + Sync + ?Sized + 'static,
{
    pub fn new(catalog: Arc<C>) -> Self {
        Self {
            catalog,
            next_id: AtomicU64::new(0),
            active: AtomicU64::new(0),
        }
    }

    /// Starts a lookup in the background and makes it the current fetch
    ///
    /// Earlier fetches keep running; their outcomes are still delivered to
    /// their handles but [`FetchRunner::accept`] will reject them.
    pub fn start(&self, query: SearchQuery) -> FetchHandle {
        let id = FetchId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        // Concurrent starts may finish out of order; the highest id wins
        self.active.fetch_max(id.0, Ordering::SeqCst);

        let (progress_sender, progress) = mpsc::unbounded_channel();
        let (sender, receiver) = oneshot::channel();
        let state = Arc::new(AtomicU8::new(FetchState::Idle as u8));

        let worker_state = Arc::clone(&state);
        let catalog = Arc::clone(&self.catalog);
        let worker_query = query.clone();
        let spawned = thread::Builder::new()
            .name(format!("fetch-{}", id.0))
            .spawn(move || {
                let outcome = run_fetch(
                    id,
                    worker_query,
                    &*catalog,
                    &worker_state,
                    move |event| {
                        // The handle may already be gone
                        let _ = progress_sender.send(event);
                    },
                );
                if sender.send(outcome).is_err() {
                    debug!("Fetch {id} finished after its handle was dropped");
                }
            });

        // The sender went down with the closure, so the handle reports the
        // fetch as failed.
        if let Err(e) = spawned {
            error!("Failed to start fetch thread: {e}");
        }

        FetchHandle {
            id,
            query,
            progress,
            receiver,
            state,
            delivered: false,
        }
    }

    /// The most recently started fetch, if any
    pub fn active(&self) -> Option<FetchId> {
        match self.active.load(Ordering::SeqCst) {
            0 => None,
            id => Some(FetchId(id)),
        }
    }

    pub fn is_current(&self, id: FetchId) -> bool {
        self.active() == Some(id)
    }

    /// Passes the outcome through if it belongs to the current fetch
    pub fn accept(&self, outcome: FetchOutcome) -> Option<FetchOutcome> {
        if self.is_current(outcome.id) {
            Some(outcome)
        } else {
            debug!(
                "Discarding outcome of superseded fetch {} for '{}'",
                outcome.id,
                outcome.query.title()
            );
            None
        }
    }
}

/// Body of a worker thread
///
/// The progress callback, and with it the progress sender, is dropped before
/// the outcome is returned.
fn run_fetch<C, F>(
    id: FetchId,
    query: SearchQuery,
    catalog: &C,
    state: &AtomicU8,
    progress_callback: F,
) -> FetchOutcome
where
    C: EpisodeCatalog + ?Sized,
    F: FnMut(ProgressEvent),
{
    FetchState::Running.store(state);
    info!("Starting fetch {id} for show: {}", query.title());

    let (final_state, result) = match try_fetch_all_episodes(catalog, &query, progress_callback) {
        Ok(result) => {
            info!(
                "Fetch {id} completed: {} seasons, {} episodes",
                result.seasons().len(),
                result.episode_count()
            );
            (FetchState::Completed, result)
        }
        Err(e) => {
            error!("Fetch {id} for '{}' failed: {e}", query.title());
            (FetchState::Failed, FetchResult::empty())
        }
    };

    final_state.store(state);
    FetchOutcome {
        id,
        query,
        state: final_state,
        result,
    }
}
