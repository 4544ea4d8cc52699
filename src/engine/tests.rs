//! Tests for engine module

use super::*;
use crate::accumulator::SharedAccumulator;
use crate::http::{HttpClient, HttpClientConfig};
use crate::session::SearchOptions;
use crate::types::AccumulatorMode;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE_SIZE: usize = 50;

fn page_body(start: usize, n: usize, session_id: Option<&str>) -> Value {
    let results: Vec<Value> = (start..start + n).map(|i| json!({"id": i})).collect();
    let mut body = json!({"results": results, "count": n, "total_count": 60});
    if let Some(id) = session_id {
        body["session_id"] = json!(id);
    }
    body
}

fn session_for(server: &MockServer) -> Session {
    let http = HttpClient::with_config(
        HttpClientConfig::builder()
            .max_attempts(3)
            .no_backoff()
            .no_rate_limit()
            .build(),
    )
    .unwrap();
    Session::new(http, format!("{}/search", server.uri()), PAGE_SIZE)
}

fn no_delay() -> BacklogThrottle {
    BacklogThrottle::new(Duration::ZERO, Duration::ZERO, Duration::ZERO)
}

async fn mount_first_page(server: &MockServer, n: usize) {
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0, n, Some("s1"))))
        .mount(server)
        .await;
}

async fn first_page(session: &mut Session) -> Page {
    session
        .search(&json!({}), SearchOptions::paginated())
        .await
        .unwrap()
}

// ============================================================================
// Type Tests
// ============================================================================

#[test]
fn test_run_state_terminal() {
    assert!(!RunState::Idle.is_terminal());
    assert!(!RunState::Running.is_terminal());
    assert!(RunState::Exhausted.is_terminal());
    assert!(RunState::Failed.is_terminal());
    assert!(RunState::Cancelled.is_terminal());
    assert_eq!(RunState::Exhausted.to_string(), "exhausted");
}

#[test]
fn test_pagination_options_builder() {
    let options = PaginationOptions::new(AccumulatorMode::List)
        .with_backlog_limit(100)
        .with_session_timeout(Duration::from_secs(60));
    assert_eq!(options.mode, AccumulatorMode::List);
    assert!(!options.wait);
    assert_eq!(options.effective_backlog_limit(), Some(100));
    assert_eq!(options.session_timeout, Some(Duration::from_secs(60)));

    let waiting = options.wait(true);
    assert_eq!(waiting.effective_backlog_limit(), None);
}

#[test]
fn test_run_progress_counts_pages() {
    let mut progress = RunProgress::default();
    progress.add_page(50, 50, 60);
    progress.add_page(10, 10, 60);
    assert_eq!(progress.pages_fetched, 2);
    assert_eq!(progress.records_fetched, 60);
    assert_eq!(progress.last_count, 10);
    assert!(progress.finished_at.is_none());

    progress.finish();
    assert!(progress.finished_at.is_some());
}

#[test]
fn test_run_handle_first_terminal_state_wins() {
    let handle = RunHandle::new(SharedAccumulator::new(AccumulatorMode::Queue, 10));
    assert!(handle.is_running());

    handle.finish(RunState::Failed, Some(Error::http_status(500, "")));
    handle.finish(RunState::Exhausted, None);

    assert_eq!(handle.state(), RunState::Failed);
    assert!(handle.last_error().is_some());
}

#[test]
fn test_run_handle_cancel_flag() {
    let handle = RunHandle::new(SharedAccumulator::new(AccumulatorMode::Queue, 10));
    let observer = handle.clone();
    assert!(!observer.is_cancelled());
    handle.cancel();
    assert!(observer.is_cancelled());
}

// ============================================================================
// Run Tests
// ============================================================================

#[tokio::test]
async fn test_short_first_page_spawns_no_worker() {
    let server = MockServer::start().await;
    mount_first_page(&server, 3).await;

    let mut session = session_for(&server);
    let first = first_page(&mut session).await;

    let accumulator = SharedAccumulator::new(AccumulatorMode::Queue, PAGE_SIZE);
    let (mut run, returned) =
        PaginationRun::start(session, first, accumulator.clone(), no_delay(), None);

    assert!(returned.is_some());
    assert!(!run.has_worker());
    assert!(!run.is_active());
    assert_eq!(run.handle().state(), RunState::Exhausted);
    assert_eq!(accumulator.len(), 1);
    assert!(run.join().await.unwrap().is_none());
}

#[tokio::test]
async fn test_full_first_page_runs_until_short_page() {
    let server = MockServer::start().await;
    mount_first_page(&server, PAGE_SIZE).await;
    Mock::given(method("POST"))
        .and(path("/search/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(50, 10, Some("s1"))))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let first = first_page(&mut session).await;

    let accumulator = SharedAccumulator::new(AccumulatorMode::List, PAGE_SIZE);
    let (mut run, returned) =
        PaginationRun::start(session, first, accumulator.clone(), no_delay(), None);
    assert!(returned.is_none());
    assert!(run.has_worker());

    let session = run.join().await.unwrap().unwrap();

    assert_eq!(run.handle().state(), RunState::Exhausted);
    assert!(!run.is_active());
    assert_eq!(accumulator.len(), 60);
    assert!(session.session_id().is_none());
    assert_eq!(session.count(), 10);

    let progress = run.handle().progress();
    assert_eq!(progress.pages_fetched, 2);
    assert_eq!(progress.records_fetched, 60);
    assert!(progress.finished_at.is_some());
}

#[tokio::test]
async fn test_queue_mode_keeps_pages_whole() {
    let server = MockServer::start().await;
    mount_first_page(&server, PAGE_SIZE).await;
    Mock::given(method("POST"))
        .and(path("/search/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(50, PAGE_SIZE, Some("s1"))))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(100, 5, None)))
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let first = first_page(&mut session).await;

    let accumulator = SharedAccumulator::new(AccumulatorMode::Queue, PAGE_SIZE);
    let (mut run, _) = PaginationRun::start(session, first, accumulator.clone(), no_delay(), None);
    run.join().await.unwrap();

    let sizes: Vec<usize> = std::iter::from_fn(|| accumulator.take())
        .map(|p| p.len())
        .collect();
    assert_eq!(sizes, vec![50, 50, 5]);
}

#[tokio::test]
async fn test_continuation_client_error_fails_run() {
    let server = MockServer::start().await;
    mount_first_page(&server, PAGE_SIZE).await;
    Mock::given(method("POST"))
        .and(path("/search/s1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "fault": {"faultstring": "Search context not found."}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let first = first_page(&mut session).await;

    let accumulator = SharedAccumulator::new(AccumulatorMode::Queue, PAGE_SIZE);
    let (mut run, _) = PaginationRun::start(session, first, accumulator.clone(), no_delay(), None);
    let session = run.join().await.unwrap().unwrap();

    assert_eq!(run.handle().state(), RunState::Failed);
    let error = run.handle().last_error().unwrap();
    assert!(matches!(*error, Error::ClientRequest { status: 401, .. }));
    assert_eq!(accumulator.len(), 1);
    assert_eq!(session.session_id(), Some("s1"));
}

#[tokio::test]
async fn test_continuation_server_errors_exhaust_retries() {
    let server = MockServer::start().await;
    mount_first_page(&server, PAGE_SIZE).await;
    Mock::given(method("POST"))
        .and(path("/search/s1"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let first = first_page(&mut session).await;

    let accumulator = SharedAccumulator::new(AccumulatorMode::Queue, PAGE_SIZE);
    let (mut run, _) = PaginationRun::start(session, first, accumulator, no_delay(), None);
    run.join().await.unwrap();

    let error = run.handle().last_error().unwrap();
    assert!(matches!(*error, Error::RetriesExhausted { attempts: 3, .. }));
}

#[tokio::test]
async fn test_cancel_interrupts_throttle_wait() {
    let server = MockServer::start().await;
    mount_first_page(&server, PAGE_SIZE).await;
    Mock::given(method("POST"))
        .and(path("/search/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(50, 10, None)))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let first = first_page(&mut session).await;

    // 50 queued records against a limit of 10 selects the long delay
    let throttle = BacklogThrottle::new(
        Duration::ZERO,
        Duration::from_secs(30),
        Duration::from_secs(60),
    );
    let accumulator = SharedAccumulator::new(AccumulatorMode::List, PAGE_SIZE);
    let (mut run, _) = PaginationRun::start(session, first, accumulator, throttle, Some(10));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(run.is_active());
    run.cancel();

    let joined = tokio::time::timeout(Duration::from_secs(5), run.join())
        .await
        .expect("worker should stop promptly");
    assert!(joined.unwrap().is_some());
    assert_eq!(run.handle().state(), RunState::Cancelled);
}

#[tokio::test]
async fn test_backlog_within_limit_uses_min_delay() {
    let server = MockServer::start().await;
    mount_first_page(&server, PAGE_SIZE).await;
    Mock::given(method("POST"))
        .and(path("/search/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(50, 10, None)))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let first = first_page(&mut session).await;

    let throttle = BacklogThrottle::new(
        Duration::from_millis(10),
        Duration::from_millis(200),
        Duration::from_millis(400),
    );
    let accumulator = SharedAccumulator::new(AccumulatorMode::Queue, PAGE_SIZE);
    let (mut run, _) =
        PaginationRun::start(session, first, accumulator.clone(), throttle, Some(100));

    run.join().await.unwrap();
    assert_eq!(run.handle().state(), RunState::Exhausted);
    assert_eq!(accumulator.backlog(), 100);
}

#[tokio::test]
async fn test_dropping_run_cancels_worker() {
    let server = MockServer::start().await;
    mount_first_page(&server, PAGE_SIZE).await;

    let mut session = session_for(&server);
    let first = first_page(&mut session).await;

    let throttle = BacklogThrottle::new(
        Duration::from_secs(60),
        Duration::from_secs(60),
        Duration::from_secs(60),
    );
    let accumulator = SharedAccumulator::new(AccumulatorMode::Queue, PAGE_SIZE);
    let (run, _) = PaginationRun::start(session, first, accumulator, throttle, None);
    let handle = run.handle().clone();

    drop(run);
    assert!(handle.is_cancelled());

    tokio::time::timeout(Duration::from_secs(5), async {
        while handle.is_running() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("worker should observe cancellation");
    assert_eq!(handle.state(), RunState::Cancelled);
}

#[tokio::test]
async fn test_empty_final_page_not_queued() {
    let server = MockServer::start().await;
    mount_first_page(&server, PAGE_SIZE).await;
    Mock::given(method("POST"))
        .and(path("/search/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [],
            "count": 0,
            "total_count": 50
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let first = first_page(&mut session).await;

    let accumulator = SharedAccumulator::new(AccumulatorMode::Queue, PAGE_SIZE);
    let (mut run, _) = PaginationRun::start(session, first, accumulator.clone(), no_delay(), None);
    run.join().await.unwrap();

    assert_eq!(run.handle().state(), RunState::Exhausted);
    assert_eq!(accumulator.len(), 1);
    assert_eq!(accumulator.backlog(), PAGE_SIZE);
    assert_eq!(accumulator.take().map(|p| p.len()), Some(PAGE_SIZE));
    assert!(accumulator.take().is_none());
    assert!(accumulator.is_empty());

    let progress = run.handle().progress();
    assert_eq!(progress.pages_fetched, 2);
    assert_eq!(progress.records_fetched, PAGE_SIZE);
    assert_eq!(progress.last_count, 0);
}

#[tokio::test]
async fn test_full_page_without_cursor_sends_nothing_more() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0, PAGE_SIZE, None)))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    let first = first_page(&mut session).await;
    assert!(session.session_id().is_none());

    let accumulator = SharedAccumulator::new(AccumulatorMode::Queue, PAGE_SIZE);
    let (mut run, returned) =
        PaginationRun::start(session, first, accumulator.clone(), no_delay(), None);
    assert!(returned.is_none());
    run.join().await.unwrap();

    assert_eq!(run.handle().state(), RunState::Exhausted);
    assert_eq!(accumulator.len(), 1);

    let progress = run.handle().progress();
    assert_eq!(progress.pages_fetched, 1);
    assert_eq!(progress.last_count, PAGE_SIZE as u64);
    assert_eq!(progress.total_count, 60);
}
