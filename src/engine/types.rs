//! Engine types
//!
//! Run states, progress counters and options for a pagination run.

use crate::types::AccumulatorMode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Lifecycle of a pagination run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run started yet
    #[default]
    Idle,
    /// Worker is fetching pages
    Running,
    /// A short page ended the session
    Exhausted,
    /// A request failed for good
    Failed,
    /// Stopped on request
    Cancelled,
}

impl RunState {
    /// Whether the run has ended
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Exhausted | Self::Failed | Self::Cancelled)
    }

    /// Short name
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Exhausted => "exhausted",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Counters of a pagination run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunProgress {
    /// Pages received, the first page included
    pub pages_fetched: usize,
    /// Records received, the first page included
    pub records_fetched: usize,
    /// `count` of the most recent successful response
    pub last_count: u64,
    /// `total_count` of the most recent successful response
    pub total_count: u64,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for RunProgress {
    fn default() -> Self {
        Self {
            pages_fetched: 0,
            records_fetched: 0,
            last_count: 0,
            total_count: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

impl RunProgress {
    /// Count one received page
    pub fn add_page(&mut self, records: usize, count: u64, total_count: u64) {
        self.pages_fetched += 1;
        self.records_fetched += records;
        self.last_count = count;
        self.total_count = total_count;
    }

    /// Stamp the end of the run
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

/// Options for starting a pagination run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationOptions {
    /// Accumulator used for this run
    pub mode: AccumulatorMode,
    /// Block until the run ends
    pub wait: bool,
    /// Backlog above which continuation requests slow down
    pub backlog_limit: Option<usize>,
    /// Server-side session idle timeout hint
    pub session_timeout: Option<Duration>,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            mode: AccumulatorMode::Queue,
            wait: false,
            backlog_limit: None,
            session_timeout: None,
        }
    }
}

impl PaginationOptions {
    /// Options for the given accumulator mode
    pub fn new(mode: AccumulatorMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Block until the run ends
    #[must_use]
    pub fn wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    /// Throttle once the backlog exceeds `limit` records
    #[must_use]
    pub fn with_backlog_limit(mut self, limit: usize) -> Self {
        self.backlog_limit = Some(limit);
        self
    }

    /// Set the session timeout hint
    #[must_use]
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = Some(timeout);
        self
    }

    /// Limit the worker actually uses; waiting callers are never throttled
    pub fn effective_backlog_limit(&self) -> Option<usize> {
        if self.wait {
            None
        } else {
            self.backlog_limit
        }
    }
}
