//! Integration tests for star collection.
//!
//! These tests ensure that collection runs complete within reasonable
//! timeouts and don't hang due to deadlocks, channel misuse, or other
//! concurrency issues.
//!
//! Key scenarios tested:
//! - Multi-page collection completes and respects the concurrency bound
//! - A failing page terminates the run instead of wedging it
//! - Cancellation interrupts slow in-flight requests promptly

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as TimeDelta, Utc};
use starhist::github::{CollectOptions, GitHubClient, GitHubError};
use starhist::http::{HttpError, HttpRequest, HttpResponse, HttpTransport};
use tokio_util::sync::CancellationToken;

/// Maximum time any collection should take in tests.
/// If exceeded, there's likely a hang/deadlock.
const COLLECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shorter timeout for runs that should be nearly instant.
const FAST_TIMEOUT: Duration = Duration::from_secs(2);

/// Scripted transport with a per-request delay and in-flight tracking.
struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    fn new(delay: Duration) -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn push(&self, url: String, status: u16, body: String) {
        self.routes
            .lock()
            .expect("routes lock")
            .entry(url)
            .or_default()
            .push_back(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.into_bytes(),
            });
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let response = self
            .routes
            .lock()
            .expect("routes lock")
            .get_mut(&request.url)
            .and_then(|q| q.pop_front());
        match response {
            Some(resp) => Ok(resp),
            None => Err(HttpError::NoMockResponse { url: request.url }),
        }
    }
}

fn page_url(page: u32, per_page: u32) -> String {
    format!(
        "https://api.github.com/repos/octocat/hello/stargazers?page={page}&per_page={per_page}"
    )
}

fn metadata_json(stars: u32) -> String {
    format!(
        r#"{{"full_name":"octocat/hello","stargazers_count":{stars},"created_at":"2019-01-01T00:00:00Z"}}"#
    )
}

fn stars_json(start: u32, n: u32) -> String {
    let base: DateTime<Utc> = "2020-01-01T00:00:00Z".parse().expect("valid timestamp");
    let events: Vec<String> = (0..n)
        .map(|i| {
            let at = base + TimeDelta::minutes(i64::from(start + i));
            format!(r#"{{"starred_at":"{}"}}"#, at.to_rfc3339())
        })
        .collect();
    format!("[{}]", events.join(","))
}

/// Script a full run: metadata plus every page up to the empty tail.
fn script_run(transport: &ScriptedTransport, stars: u32, per_page: u32) {
    transport.push(
        "https://api.github.com/repos/octocat/hello".to_string(),
        200,
        metadata_json(stars),
    );

    let full_pages = stars / per_page;
    let mut emitted = 0;
    for page in 1..=full_pages {
        transport.push(page_url(page, per_page), 200, stars_json(emitted, per_page));
        emitted += per_page;
    }
    let remainder = stars % per_page;
    if remainder > 0 {
        transport.push(
            page_url(full_pages + 1, per_page),
            200,
            stars_json(emitted, remainder),
        );
    } else {
        transport.push(page_url(full_pages + 1, per_page), 200, "[]".to_string());
    }
}

fn client_for(transport: Arc<ScriptedTransport>, page_size: u32) -> GitHubClient {
    GitHubClient::new(transport).with_options(CollectOptions {
        page_size,
        ..CollectOptions::default()
    })
}

#[tokio::test]
async fn multi_page_collection_completes_and_bounds_concurrency() {
    let transport = Arc::new(ScriptedTransport::new(Duration::from_millis(5)));
    // 78 stars at page size 2: 39 full pages plus a short tail.
    script_run(&transport, 78, 2);

    let client = client_for(Arc::clone(&transport), 2);
    let stars = tokio::time::timeout(
        COLLECT_TIMEOUT,
        client.collect_stars("octocat/hello", &CancellationToken::new(), None),
    )
    .await
    .expect("collection should not hang")
    .expect("collection should succeed");

    assert_eq!(stars.len(), 78);
    assert!(stars.windows(2).all(|w| w[0].starred_at <= w[1].starred_at));
    // Pages never exceed the fan-out bound. Metadata goes first, alone.
    assert!(transport.max_in_flight() <= 4);
}

#[tokio::test]
async fn failing_page_terminates_the_run() {
    let transport = Arc::new(ScriptedTransport::new(Duration::from_millis(5)));
    script_run(&transport, 10, 2);
    // Replace page 3 with a 403 by draining its scripted response first.
    transport
        .routes
        .lock()
        .expect("routes lock")
        .remove(&page_url(3, 2));
    transport.push(page_url(3, 2), 403, String::new());

    let client = client_for(Arc::clone(&transport), 2);
    let err = tokio::time::timeout(
        COLLECT_TIMEOUT,
        client.collect_stars("octocat/hello", &CancellationToken::new(), None),
    )
    .await
    .expect("failed run should still terminate")
    .expect_err("403 must fail the run");

    assert!(matches!(err, GitHubError::RateLimited));
}

#[tokio::test]
async fn cancellation_interrupts_slow_requests() {
    // Every request takes a minute; only cancellation can end this run
    // inside the timeout.
    let transport = Arc::new(ScriptedTransport::new(Duration::from_secs(60)));
    script_run(&transport, 10, 2);

    let client = client_for(Arc::clone(&transport), 2);
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = tokio::time::timeout(
        FAST_TIMEOUT,
        client.collect_stars("octocat/hello", &cancel, None),
    )
    .await
    .expect("cancellation should interrupt the in-flight request")
    .expect_err("cancelled run must not produce data");

    assert!(matches!(err, GitHubError::Cancelled));
}
