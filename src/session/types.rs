//! Session types
//!
//! Response page and search options.

use crate::types::Record;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Result records of this page
    #[serde(default)]
    pub results: Vec<Record>,
    /// Number of records in this page as reported by the service
    #[serde(default)]
    pub count: u64,
    /// Total number of matches for the query
    #[serde(default)]
    pub total_count: u64,
    /// Cursor for the next page, when the search is paginated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Page {
    /// Number of records actually present
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the page carries no records
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Whether this page is shorter than a full page
    pub fn is_short(&self, page_size: usize) -> bool {
        self.results.len() < page_size
    }
}

/// Options for the first request of a search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Ask the service to open a session for continuation
    pub paginate: bool,
    /// Server-side session idle timeout hint
    pub session_timeout: Option<Duration>,
}

impl SearchOptions {
    /// A single, non-paginated search
    pub fn single() -> Self {
        Self::default()
    }

    /// A search that opens a session
    pub fn paginated() -> Self {
        Self {
            paginate: true,
            session_timeout: None,
        }
    }

    /// Set the session timeout hint
    #[must_use]
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = Some(timeout);
        self
    }
}
