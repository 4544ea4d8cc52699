//! Search session state and requests

use super::types::{Page, SearchOptions};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Cursor and counters of one search session
///
/// The session is owned by whoever issues its requests. During a background
/// pagination run it moves into the worker and comes back when the worker
/// is joined.
#[derive(Debug, Clone)]
pub struct Session {
    http: HttpClient,
    base_url: String,
    page_size: usize,
    session_id: Option<String>,
    last_query: Option<Value>,
    count: u64,
    total_count: u64,
}

impl Session {
    /// Create a session for the given search endpoint
    pub fn new(http: HttpClient, base_url: impl Into<String>, page_size: usize) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            page_size,
            session_id: None,
            last_query: None,
            count: 0,
            total_count: 0,
        }
    }

    /// Run a new search
    ///
    /// Any cursor left over from an earlier search is dropped before the
    /// request is sent.
    pub async fn search(&mut self, query: &Value, options: SearchOptions) -> Result<Page> {
        self.session_id = None;
        self.last_query = Some(query.clone());

        let mut request = RequestConfig::new()
            .query("size", self.page_size)
            .json(query.clone());
        if options.paginate {
            request = request.query("paginate", true);
        }
        if let Some(timeout) = options.session_timeout {
            request = request.query("session_timeout", timeout.as_secs());
        }

        let page: Page = self.http.post_json(&self.base_url, request).await?;
        if page.count == 0 {
            warn!("PDS returned no results for query: {}", query);
        }

        self.record(&page);
        Ok(page)
    }

    /// Fetch the next page of the open session
    ///
    /// Without a cursor nothing is sent and an empty page comes back; the
    /// usual cause is that the previous page already ended the session.
    pub async fn next(&mut self) -> Result<Page> {
        let Some(session_id) = self.session_id.clone() else {
            warn!("Trying to paginate with no session_id available");
            return Ok(Page::default());
        };

        let url = session_url(&self.base_url, &session_id)?;
        let page: Page = self.http.post_json(&url, RequestConfig::new()).await?;
        debug!(
            "Session {} returned {} of {} records",
            session_id,
            page.len(),
            page.total_count
        );

        self.record(&page);
        Ok(page)
    }

    fn record(&mut self, page: &Page) {
        self.count = page.count;
        self.total_count = page.total_count;

        if let Some(ref id) = page.session_id {
            self.session_id = Some(id.clone());
        }
        if self.is_exhausted(page) && self.session_id.is_some() {
            debug!(
                "Page of {} below page size {}, session exhausted",
                page.len(),
                self.page_size
            );
            self.session_id = None;
        }
    }

    /// Whether this page ends the session
    pub fn is_exhausted(&self, page: &Page) -> bool {
        page.is_short(self.page_size)
    }

    /// Whether a continuation request would be sent
    pub fn is_active(&self) -> bool {
        self.session_id.is_some()
    }

    /// Forget the cursor
    pub fn clear(&mut self) {
        self.session_id = None;
    }

    /// Current cursor
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Query of the most recent search
    pub fn last_query(&self) -> Option<&Value> {
        self.last_query.as_ref()
    }

    /// `count` of the most recent successful response
    pub fn count(&self) -> u64 {
        self.count
    }

    /// `total_count` of the most recent successful response
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Configured page size
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Search endpoint
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// URL of the continuation endpoint for a session
///
/// The identifier becomes the last path segment; a query string on the base
/// URL is kept.
pub fn session_url(base_url: &str, session_id: &str) -> Result<String> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|()| Error::config(format!("base URL cannot take a path: {base_url}")))?
        .pop_if_empty()
        .push(session_id);
    Ok(url.to_string())
}
