//! PDS client
//!
//! `PdsClient` is the entry point: it owns the configuration, the search
//! session while no worker is using it, and the current pagination run.

use crate::accumulator::SharedAccumulator;
use crate::config::ClientConfig;
use crate::engine::{PaginationOptions, PaginationRun, RunProgress, RunState};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig};
use crate::person::{make_people, Person};
use crate::session::{Page, SearchOptions, Session};
use crate::throttle::BacklogThrottle;
use crate::types::{AccumulatorMode, Record};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Client for the PDS person search API
///
/// One client runs at most one pagination run at a time. While a run's
/// worker is fetching, the session belongs to the worker: `search`, `next`
/// and a second `start_pagination` fail with
/// [`Error::PaginationInProgress`].
///
/// ```rust,ignore
/// use pds_client::{AccumulatorMode, ClientConfig, PaginationOptions, PdsClient};
///
/// let mut client = PdsClient::new(ClientConfig::new("my-key"))?;
/// let query = serde_json::json!({"fields": ["names"], "conditions": {"names.name": "smith"}});
/// client
///     .start_pagination(&query, PaginationOptions::new(AccumulatorMode::List).with_backlog_limit(500))
///     .await?;
/// while client.is_paginating() || client.has_results() {
///     if let Some(batch) = client.next_people() {
///         // process batch
///     }
/// }
/// ```
#[derive(Debug)]
pub struct PdsClient {
    config: ClientConfig,
    http: HttpClient,
    throttle: BacklogThrottle,
    session: Option<Session>,
    run: Option<PaginationRun>,
}

impl PdsClient {
    /// Create a client; fails when the API key is missing or the config is invalid
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let api_key = config.require_api_key()?;

        let mut http_config = HttpClientConfig::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .max_attempts(config.retry_limit)
            .backoff(
                config.retry_backoff.backoff_type,
                config.retry_backoff.initial(),
                config.retry_backoff.max(),
            )
            .header("x-api-key", api_key)
            .header("Content-Type", "application/json");
        if let Some(rate_limit) = RateLimiterConfig::from_settings(&config.rate_limit) {
            http_config = http_config.rate_limit(rate_limit);
        }
        let http = HttpClient::with_config(http_config.build())?;

        let session = Session::new(http.clone(), config.resolved_base_url(), config.page_size);
        let throttle = BacklogThrottle::from_config(&config.throttle);

        Ok(Self {
            config,
            http,
            throttle,
            session: Some(session),
            run: None,
        })
    }

    /// Client for the production environment with default settings
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(api_key))
    }

    /// Client configured from `PDS_APIKEY` / `PDS_ENVIRONMENT`
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Configuration in use
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Search endpoint in use
    pub fn base_url(&self) -> &str {
        self.config.resolved_base_url()
    }

    /// Records requested per page
    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    // ========================================================================
    // Session ownership
    // ========================================================================

    fn fresh_session(&self) -> Session {
        Session::new(
            self.http.clone(),
            self.config.resolved_base_url(),
            self.config.page_size,
        )
    }

    fn restore(&mut self, joined: Result<Option<Session>>) -> Result<()> {
        match joined {
            Ok(Some(session)) => {
                self.session = Some(session);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                // the session died with the worker
                self.session = Some(self.fresh_session());
                Err(e)
            }
        }
    }

    /// Take the session back from a worker that has stopped
    async fn reclaim(&mut self) {
        let joined = match self.run.as_mut() {
            Some(run) if run.has_worker() && !run.is_active() => run.join().await,
            _ => return,
        };
        if let Err(e) = self.restore(joined) {
            warn!("Previous pagination run ended abnormally: {}", e);
        }
    }

    async fn session_mut(&mut self) -> Result<&mut Session> {
        self.reclaim().await;
        self.session.as_mut().ok_or(Error::PaginationInProgress)
    }

    // ========================================================================
    // Single requests
    // ========================================================================

    /// Run a search, optionally opening a session for `next`
    pub async fn search(&mut self, query: &Value, paginate: bool) -> Result<Page> {
        let options = SearchOptions {
            paginate,
            session_timeout: None,
        };
        self.search_with(query, options).await
    }

    /// Run a search with explicit options
    pub async fn search_with(&mut self, query: &Value, options: SearchOptions) -> Result<Page> {
        self.session_mut().await?.search(query, options).await
    }

    /// Fetch the next page of the open session
    ///
    /// Returns an empty page when no session is open.
    pub async fn next(&mut self) -> Result<Page> {
        self.session_mut().await?.next().await
    }

    /// Run a single search and wrap the results
    pub async fn get_people(&mut self, query: &Value) -> Result<Vec<Person>> {
        let page = self.search(query, false).await?;
        Ok(make_people(page.results))
    }

    // ========================================================================
    // Pagination
    // ========================================================================

    /// Start retrieving every page of a search
    ///
    /// The first request runs on the caller's task so an immediate failure
    /// is returned directly. When the first page is already short no worker
    /// is spawned and the run is `Exhausted` at once. With `options.wait`
    /// the call returns only after the run has ended.
    pub async fn start_pagination(
        &mut self,
        query: &Value,
        options: PaginationOptions,
    ) -> Result<RunState> {
        if self.is_paginating() {
            return Err(Error::PaginationInProgress);
        }

        let search = SearchOptions {
            paginate: true,
            session_timeout: options.session_timeout,
        };
        let first = self.session_mut().await?.search(query, search).await?;

        if let Some(previous) = &self.run {
            let left = previous.handle().accumulator().len();
            if left > 0 {
                warn!(
                    "Discarding {} unconsumed {} entries from previous pagination run",
                    left,
                    previous.handle().accumulator().mode()
                );
            }
        }

        let session = self.session.take().ok_or(Error::PaginationInProgress)?;
        let accumulator = SharedAccumulator::new(options.mode, self.config.page_size);
        info!(
            "Starting pagination: {} of {} records in first page, {} mode",
            first.len(),
            first.total_count,
            options.mode
        );

        let (run, returned) = PaginationRun::start(
            session,
            first,
            accumulator,
            self.throttle,
            options.effective_backlog_limit(),
        );
        self.session = returned;
        self.run = Some(run);

        if options.wait {
            self.wait_for_completion().await?;
        }
        Ok(self.run_state())
    }

    /// Whether a worker is still fetching pages
    pub fn is_paginating(&self) -> bool {
        self.run.as_ref().is_some_and(PaginationRun::is_active)
    }

    /// Wait for the current run to end
    ///
    /// Returns whether results are still waiting to be taken.
    pub async fn wait_for_completion(&mut self) -> Result<bool> {
        let Some(run) = self.run.as_mut() else {
            return Ok(false);
        };
        let joined = run.join().await;
        self.restore(joined)?;
        Ok(self.has_results())
    }

    /// Ask the current worker to stop before its next request
    pub fn cancel(&self) {
        if let Some(run) = &self.run {
            run.cancel();
        }
    }

    /// State of the current run, `Idle` when none was started
    pub fn run_state(&self) -> RunState {
        self.run
            .as_ref()
            .map_or(RunState::Idle, |run| run.handle().state())
    }

    /// Error that ended the current run, if it failed
    pub fn last_error(&self) -> Option<Arc<Error>> {
        self.run.as_ref().and_then(|run| run.handle().last_error())
    }

    /// Counters of the current run
    pub fn progress(&self) -> Option<RunProgress> {
        self.run.as_ref().map(|run| run.handle().progress())
    }

    fn accumulator(&self) -> Option<&SharedAccumulator> {
        self.run.as_ref().map(|run| run.handle().accumulator())
    }

    /// Accumulator mode of the current run
    pub fn accumulator_mode(&self) -> Option<AccumulatorMode> {
        self.accumulator().map(SharedAccumulator::mode)
    }

    /// Take the next batch of results without blocking
    ///
    /// Queue mode yields one page, list mode up to a page size of records.
    pub fn next_results(&self) -> Option<Vec<Record>> {
        self.accumulator().and_then(SharedAccumulator::take)
    }

    /// Take the next batch of results as people
    pub fn next_people(&self) -> Option<Vec<Person>> {
        self.next_results().map(make_people)
    }

    /// Take every result collected so far
    pub fn drain_results(&self) -> Vec<Record> {
        self.accumulator()
            .map(SharedAccumulator::drain_all)
            .unwrap_or_default()
    }

    /// Whether results are waiting to be taken
    pub fn has_results(&self) -> bool {
        self.accumulator().is_some_and(|acc| !acc.is_empty())
    }

    /// Records-equivalent size of the waiting results
    pub fn backlog(&self) -> usize {
        self.accumulator().map_or(0, SharedAccumulator::backlog)
    }

    // ========================================================================
    // Session diagnostics
    // ========================================================================

    /// Cursor of the open session
    ///
    /// `None` while a worker holds the session. That includes a worker that
    /// has finished but not been joined yet: the session only returns on
    /// `wait_for_completion` or the next `search`/`next`/`start_pagination`.
    /// In that window `count` and `total_count` come from the run progress.
    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().and_then(Session::session_id)
    }

    /// Query of the most recent search; `None` while a worker holds the session
    pub fn last_query(&self) -> Option<&Value> {
        self.session.as_ref().and_then(Session::last_query)
    }

    /// `count` of the most recent successful response
    pub fn count(&self) -> u64 {
        match &self.session {
            Some(session) => session.count(),
            None => self.progress().map_or(0, |p| p.last_count),
        }
    }

    /// `total_count` of the most recent successful response
    pub fn total_count(&self) -> u64 {
        match &self.session {
            Some(session) => session.total_count(),
            None => self.progress().map_or(0, |p| p.total_count),
        }
    }
}
