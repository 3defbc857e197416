//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up fixture sites and exercise the
//! full crawl cycle end-to-end, including retry counting, duplicate
//! detection, dry-run behavior, and robots.txt handling.

use quote_harvest::{CrawlController, CrawlSession, RetryPolicy, StopReason};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Page 1 of the fixture site: three quotes and a link to page 2
fn fixture_page_one() -> String {
    r#"<html><body>
    <div class="quote">
        <span class="text">“The only true wisdom is in knowing you know nothing.”</span>
        <span>by <small class="author">Socrates</small>
            <a href="/author/Socrates">(about)</a>
        </span>
        <div class="tags">
            <a class="tag" href="/tag/wisdom/">wisdom</a>
            <a class="tag" href="/tag/knowledge/">knowledge</a>
        </div>
    </div>
    <div class="quote">
        <span class="text">“Träume groß.”</span>
        <span>by <small class="author">Unbekannt</small></span>
    </div>
    <div class="quote">
        <span class="text">“Do or do not.”</span>
        <span>by <small class="author">Yoda</small></span>
        <div class="tags"><a class="tag" href="/tag/resolve/">resolve</a></div>
    </div>
    <ul class="pager"><li class="next"><a href="/page/2/">Next</a></li></ul>
    </body></html>"#
        .to_string()
}

/// Page 2 of the fixture site: two quotes, no next link
fn fixture_page_two() -> String {
    r#"<html><body>
    <div class="quote">
        <span class="text">“Simplicity is the ultimate sophistication.”</span>
        <span>by <small class="author">Leonardo da Vinci</small></span>
    </div>
    <div class="quote">
        <span class="text">“Less is more.”</span>
        <span>by <small class="author">Mies van der Rohe</small></span>
    </div>
    </body></html>"#
        .to_string()
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

async fn mount_fixture_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page/1/"))
        .respond_with(html_response(fixture_page_one()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page/2/"))
        .respond_with(html_response(fixture_page_two()))
        .mount(server)
        .await;
}

fn session_for(server: &MockServer, max_pages: u32, out: &Path) -> CrawlSession {
    let start = Url::parse(&format!("{}/page/1/", server.uri())).unwrap();
    CrawlSession::new(start, max_pages, 0, false).with_output_path(out.to_path_buf())
}

fn output_lines(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).expect("output line is not valid JSON"))
        .collect()
}

#[tokio::test]
async fn test_two_page_site_stops_at_natural_end() {
    let server = MockServer::start().await;
    mount_fixture_site(&server).await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("items.jsonl");

    // robots.txt answers 404 here, so this also covers the fail-open path:
    // the crawl proceeds exactly as if no policy document existed
    let controller = CrawlController::new(session_for(&server, 5, &out)).unwrap();
    let report = controller.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::NoNextPage);
    assert_eq!(report.pages_crawled, 2);
    assert_eq!(report.records_written, 5);

    let lines = output_lines(&out);
    assert_eq!(lines.len(), 5);

    // Records appear in extraction order, page 1 before page 2
    assert_eq!(
        lines[0]["text"],
        "“The only true wisdom is in knowing you know nothing.”"
    );
    assert_eq!(lines[0]["author"], "Socrates");
    assert_eq!(lines[0]["tags"], serde_json::json!(["wisdom", "knowledge"]));
    assert_eq!(lines[0]["tag_count"], 2);
    assert_eq!(
        lines[0]["author_url"],
        format!("{}/author/Socrates", server.uri())
    );
    assert_eq!(lines[0]["url"], format!("{}/page/1/", server.uri()));
    assert_eq!(lines[4]["text"], "“Less is more.”");
    assert_eq!(lines[4]["url"], format!("{}/page/2/", server.uri()));
}

#[tokio::test]
async fn test_page_budget_stops_before_next_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page/1/"))
        .respond_with(html_response(fixture_page_one()))
        .expect(1)
        .mount(&server)
        .await;

    // Page 2 must never be requested with a budget of one page
    Mock::given(method("GET"))
        .and(path("/page/2/"))
        .respond_with(html_response(fixture_page_two()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("items.jsonl");

    let controller = CrawlController::new(session_for(&server, 1, &out)).unwrap();
    let report = controller.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::PageBudgetExhausted);
    assert_eq!(report.pages_crawled, 1);
    assert_eq!(report.records_written, 3);
    assert_eq!(output_lines(&out).len(), 3);
}

#[tokio::test]
async fn test_404_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page/1/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("items.jsonl");

    let controller = CrawlController::new(session_for(&server, 5, &out)).unwrap();
    let report = controller.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::FetchFailed);
    assert_eq!(report.pages_crawled, 0);
    assert_eq!(report.records_written, 0);
}

#[tokio::test]
async fn test_503_is_retried_max_retries_times_with_backoff() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page/1/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("items.jsonl");

    let policy = RetryPolicy {
        max_retries: 3,
        backoff_factor: 2,
    };
    let controller =
        CrawlController::with_retry_policy(session_for(&server, 5, &out), policy).unwrap();

    let start = Instant::now();
    let report = controller.run().await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(report.stop_reason, StopReason::FetchFailed);
    // Backoff of 2^0 and 2^1 seconds between the three attempts, none
    // after the last
    assert!(
        elapsed >= Duration::from_secs(3),
        "expected at least 3s of backoff, got {:?}",
        elapsed
    );
    assert!(elapsed < Duration::from_secs(7));
}

#[tokio::test]
async fn test_fetch_recovers_after_transient_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    // First attempt fails, second succeeds
    Mock::given(method("GET"))
        .and(path("/page/1/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page/1/"))
        .respond_with(html_response(fixture_page_two()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("items.jsonl");

    let controller = CrawlController::new(session_for(&server, 1, &out)).unwrap();
    let report = controller.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::NoNextPage);
    assert_eq!(report.records_written, 2);
    assert_eq!(output_lines(&out).len(), 2);
}

#[tokio::test]
async fn test_pagination_cycle_stops_without_duplicates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    // Page 1 links to page 2; page 2 links back to page 1
    Mock::given(method("GET"))
        .and(path("/page/1/"))
        .respond_with(html_response(fixture_page_one()))
        .expect(1)
        .mount(&server)
        .await;

    let cycling_page_two = r#"<html><body>
        <div class="quote"><span class="text">“around we go”</span></div>
        <ul class="pager"><li class="next"><a href="/page/1/">Next</a></li></ul>
        </body></html>"#;

    Mock::given(method("GET"))
        .and(path("/page/2/"))
        .respond_with(html_response(cycling_page_two.to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("items.jsonl");

    let controller = CrawlController::new(session_for(&server, 10, &out)).unwrap();
    let report = controller.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::DuplicateUrl);
    assert_eq!(report.pages_crawled, 2);
    assert_eq!(report.records_written, 4);
    // No record from page 1 appears twice
    assert_eq!(output_lines(&out).len(), 4);
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let server = MockServer::start().await;

    // No request of any kind is expected, robots.txt included
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("items.jsonl");

    let start = Url::parse(&format!("{}/page/1/", server.uri())).unwrap();
    let session =
        CrawlSession::new(start, 4, 0, true).with_output_path(out.clone());

    let controller = CrawlController::new(session).unwrap();
    let report = controller.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::PageBudgetExhausted);
    assert_eq!(report.pages_crawled, 4);
    assert_eq!(report.records_written, 0);
    assert!(!out.exists(), "dry run must not create the output file");
}

#[tokio::test]
async fn test_policy_denial_stops_before_any_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page/1/"))
        .respond_with(html_response(fixture_page_one()))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("items.jsonl");
    std::fs::write(&out, "records from an earlier run\n").unwrap();

    let controller = CrawlController::new(session_for(&server, 5, &out)).unwrap();
    let report = controller.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::PolicyDenied);
    assert_eq!(report.pages_crawled, 0);

    // The write path never ran, so the old contents survive
    assert_eq!(
        std::fs::read_to_string(&out).unwrap(),
        "records from an earlier run\n"
    );
}

#[tokio::test]
async fn test_policy_denial_is_bypassed_in_dry_run() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("items.jsonl");

    // No server at all: dry run must not need one
    let start = Url::parse("http://127.0.0.1:9/page/1/").unwrap();
    let session = CrawlSession::new(start, 2, 0, true).with_output_path(out.clone());

    let controller = CrawlController::new(session).unwrap();
    let report = controller.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::PageBudgetExhausted);
    assert_eq!(report.pages_crawled, 2);
    assert!(!out.exists());
}

#[tokio::test]
async fn test_fetch_failure_preserves_earlier_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page/1/"))
        .respond_with(html_response(fixture_page_one()))
        .mount(&server)
        .await;

    // Page 2 is gone; the run stops degraded but keeps page 1's records
    Mock::given(method("GET"))
        .and(path("/page/2/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("items.jsonl");

    let controller = CrawlController::new(session_for(&server, 5, &out)).unwrap();
    let report = controller.run().await.unwrap();

    assert_eq!(report.stop_reason, StopReason::FetchFailed);
    assert_eq!(report.pages_crawled, 1);
    assert_eq!(report.records_written, 3);
    assert_eq!(output_lines(&out).len(), 3);
}

#[tokio::test]
async fn test_output_preserves_unicode() {
    let server = MockServer::start().await;
    mount_fixture_site(&server).await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("items.jsonl");

    let controller = CrawlController::new(session_for(&server, 5, &out)).unwrap();
    controller.run().await.unwrap();

    let raw = std::fs::read_to_string(&out).unwrap();
    assert!(raw.contains("“Träume groß.”"));
    assert!(!raw.contains("\\u201c"));
}
