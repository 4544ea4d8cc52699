//! Pagination engine
//!
//! Background retrieval of the remaining pages of a search session.
//!
//! # Overview
//!
//! The engine module provides:
//! - `PaginationWorker` - the loop that throttles, fetches and appends pages
//! - `PaginationRun` - one started run: its shared state and the worker task
//! - `RunHandle` - the state both sides observe (accumulator, status, cancel flag)
//!
//! ```text
//!   owner task                          worker task
//!   ──────────                          ───────────
//!   search(paginate) ─► first page
//!   push first page ──► Accumulator ◄── push page
//!   spawn ───────────────────────────►  loop {
//!   take() ◄───────── Accumulator         throttle(backlog)
//!   cancel() ─────────► flag ─────────►   check flag
//!   join() ◄──────────── Session ◄──────  next() }
//! ```

mod types;

pub use types::{PaginationOptions, RunProgress, RunState};

use crate::accumulator::SharedAccumulator;
use crate::error::{Error, Result};
use crate::session::{Page, Session};
use crate::throttle::BacklogThrottle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

// ============================================================================
// Run Handle
// ============================================================================

#[derive(Debug, Default)]
struct RunStatus {
    state: RunState,
    last_error: Option<Arc<Error>>,
    progress: RunProgress,
}

#[derive(Debug)]
struct RunShared {
    accumulator: SharedAccumulator,
    status: Mutex<RunStatus>,
    cancelled: AtomicBool,
    wake: Notify,
}

/// State of a pagination run shared by the owner and the worker
#[derive(Debug, Clone)]
pub struct RunHandle {
    shared: Arc<RunShared>,
}

impl RunHandle {
    /// Create the shared state of a new run in the `Running` state
    pub fn new(accumulator: SharedAccumulator) -> Self {
        Self {
            shared: Arc::new(RunShared {
                accumulator,
                status: Mutex::new(RunStatus {
                    state: RunState::Running,
                    ..RunStatus::default()
                }),
                cancelled: AtomicBool::new(false),
                wake: Notify::new(),
            }),
        }
    }

    fn status(&self) -> MutexGuard<'_, RunStatus> {
        self.shared
            .status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Accumulator the run appends to
    pub fn accumulator(&self) -> &SharedAccumulator {
        &self.shared.accumulator
    }

    /// Current state
    pub fn state(&self) -> RunState {
        self.status().state
    }

    /// Whether the worker is still fetching
    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    /// Error that ended the run, if it failed
    pub fn last_error(&self) -> Option<Arc<Error>> {
        self.status().last_error.clone()
    }

    /// Snapshot of the run counters
    pub fn progress(&self) -> RunProgress {
        self.status().progress.clone()
    }

    /// Ask the worker to stop before its next request
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        self.shared.wake.notify_one();
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Count a received page and append its records
    ///
    /// Empty pages are counted but never reach the accumulator.
    pub fn push_page(&self, page: Page) {
        self.status()
            .progress
            .add_page(page.len(), page.count, page.total_count);
        if !page.is_empty() {
            self.shared.accumulator.push_page(page.results);
        }
    }

    /// Move to a terminal state; the first terminal state wins
    pub fn finish(&self, state: RunState, error: Option<Error>) {
        let mut status = self.status();
        if status.state.is_terminal() {
            return;
        }
        status.state = state;
        status.last_error = error.map(Arc::new);
        status.progress.finish();
    }

    /// Sleep for `delay` unless cancelled first; false when cancelled
    async fn pause(&self, delay: Duration) -> bool {
        if !delay.is_zero() {
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.shared.wake.notified() => {}
            }
        }
        !self.is_cancelled()
    }
}

// ============================================================================
// Pagination Worker
// ============================================================================

/// Background loop fetching the remaining pages of a session
pub struct PaginationWorker {
    session: Session,
    run: RunHandle,
    throttle: BacklogThrottle,
    backlog_limit: Option<usize>,
}

impl PaginationWorker {
    /// Create a worker for an open session
    pub fn new(
        session: Session,
        run: RunHandle,
        throttle: BacklogThrottle,
        backlog_limit: Option<usize>,
    ) -> Self {
        Self {
            session,
            run,
            throttle,
            backlog_limit,
        }
    }

    /// Run until the session is exhausted, a request fails, or cancellation
    ///
    /// Hands the session back so its cursor and counters survive the run.
    pub async fn run(mut self) -> Session {
        info!(
            "Pagination worker started (backlog limit: {:?})",
            self.backlog_limit
        );

        let (state, error) = match self.fetch_remaining().await {
            Ok(state) => (state, None),
            Err(e) => {
                error!("Pagination stopped after failure: {}", e);
                (RunState::Failed, Some(e))
            }
        };
        self.run.finish(state, error);

        let progress = self.run.progress();
        info!(
            "Pagination worker {}: {} pages, {} records",
            state, progress.pages_fetched, progress.records_fetched
        );
        self.session
    }

    async fn fetch_remaining(&mut self) -> Result<RunState> {
        loop {
            if self.run.is_cancelled() {
                return Ok(RunState::Cancelled);
            }

            let backlog = self.run.accumulator().backlog();
            let delay = self
                .throttle
                .delay_before_next_fetch(backlog, self.backlog_limit);
            if delay > self.throttle.min_delay() {
                info!(
                    "Backlog of {} records over limit, waiting {:?} before next page",
                    backlog, delay
                );
            }
            if !self.run.pause(delay).await {
                return Ok(RunState::Cancelled);
            }

            if !self.session.is_active() {
                warn!("Full page came back without a session_id, stopping");
                return Ok(RunState::Exhausted);
            }

            let page = self.session.next().await?;
            let exhausted = self.session.is_exhausted(&page);
            debug!("Fetched page of {} records", page.len());
            self.run.push_page(page);

            if exhausted {
                return Ok(RunState::Exhausted);
            }
        }
    }
}

// ============================================================================
// Pagination Run
// ============================================================================

/// A started pagination run
#[derive(Debug)]
pub struct PaginationRun {
    handle: RunHandle,
    worker: Option<JoinHandle<Session>>,
}

impl PaginationRun {
    /// Begin a run from its first page
    ///
    /// The first page is appended before anything else. When it already
    /// ends the session no worker is spawned and the session is handed
    /// straight back; otherwise it moves into the worker and `None` is
    /// returned in its place.
    pub fn start(
        session: Session,
        first: Page,
        accumulator: SharedAccumulator,
        throttle: BacklogThrottle,
        backlog_limit: Option<usize>,
    ) -> (Self, Option<Session>) {
        let handle = RunHandle::new(accumulator);
        let exhausted = session.is_exhausted(&first);
        handle.push_page(first);

        if exhausted {
            handle.finish(RunState::Exhausted, None);
            let run = Self {
                handle,
                worker: None,
            };
            return (run, Some(session));
        }

        let worker = PaginationWorker::new(session, handle.clone(), throttle, backlog_limit);
        let run = Self {
            handle,
            worker: Some(tokio::spawn(worker.run())),
        };
        (run, None)
    }

    /// Shared state of this run
    pub fn handle(&self) -> &RunHandle {
        &self.handle
    }

    /// Whether the worker may still append pages
    pub fn is_active(&self) -> bool {
        self.handle.is_running() && self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Whether a worker task exists that has not been joined
    pub fn has_worker(&self) -> bool {
        self.worker.is_some()
    }

    /// Ask the worker to stop
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// Wait for the worker and take back its session
    ///
    /// Returns `Ok(None)` when there is no worker to join.
    pub async fn join(&mut self) -> Result<Option<Session>> {
        let Some(worker) = self.worker.take() else {
            return Ok(None);
        };

        match worker.await {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                let message = e.to_string();
                error!("Pagination worker ended abnormally: {}", message);
                self.handle.finish(
                    RunState::Failed,
                    Some(Error::Worker {
                        message: message.clone(),
                    }),
                );
                Err(Error::Worker { message })
            }
        }
    }
}

impl Drop for PaginationRun {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests;
