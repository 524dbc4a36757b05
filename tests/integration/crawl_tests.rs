//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use ripple_crawl::config::Config;
use ripple_crawl::CrawlError;
use ripple_crawl::crawler::{crawl, sink_fn, Coordinator, Fetcher, HttpFetcher, PageSink};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Sink that records every URL it receives along with the body length
fn recording_sink() -> (Arc<dyn PageSink>, Arc<Mutex<Vec<(String, usize)>>>) {
    let pages = Arc::new(Mutex::new(Vec::new()));
    let pages_handle = Arc::clone(&pages);
    let sink = sink_fn(move |url, body| {
        pages_handle
            .lock()
            .unwrap()
            .push((url.to_string(), body.len()));
        Ok(())
    });
    let sink: Arc<dyn PageSink> = Arc::new(sink);
    (sink, pages)
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler.request_timeout_ms = 5_000;
    config
}

async fn mount_html(server: &MockServer, route: &str, body: String, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Index links to two pages, one absolute and one relative
    mount_html(
        &mock_server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{}/page1">Page 1</a>
            <a href="page2">Page 2</a>
            </body></html>"#,
            base_url
        ),
        1,
    )
    .await;

    // Page 1 links back home and to page 2; both already scheduled
    mount_html(
        &mock_server,
        "/page1",
        r#"<html><body><a href="/">Home</a><a href="/page2#top">Page 2</a></body></html>"#
            .to_string(),
        1,
    )
    .await;

    mount_html(
        &mock_server,
        "/page2",
        r#"<html><body>Content 2</body></html>"#.to_string(),
        1,
    )
    .await;

    let (sink, pages) = recording_sink();
    let summary = crawl(&test_config(), vec![format!("{}/", base_url)], sink)
        .await
        .expect("Crawl failed");

    assert_eq!(summary.tasks_spawned, 3);
    assert_eq!(summary.tasks_succeeded, 3);
    assert_eq!(summary.tasks_failed, 0);
    assert!(summary.seen.contains(&format!("{}/page1", base_url)));
    assert!(summary.seen.contains(&format!("{}/page2", base_url)));

    let mut sunk: Vec<String> = pages.lock().unwrap().iter().map(|(u, _)| u.clone()).collect();
    sunk.sort();
    assert_eq!(
        sunk,
        vec![
            format!("{}/", base_url),
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
        ]
    );

    // Wiremock verifies the `expect(1)` counts when mock_server drops
}

#[tokio::test]
async fn test_error_status_body_is_still_scanned() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(r#"<html><body><a href="/found">Try this</a></body></html>"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_html(&mock_server, "/found", "<p>here</p>".to_string(), 1).await;

    let (sink, pages) = recording_sink();
    let summary = crawl(&test_config(), vec![format!("{}/", base_url)], sink)
        .await
        .expect("Crawl failed");

    assert_eq!(summary.tasks_succeeded, 2);
    assert_eq!(pages.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unreachable_link_does_not_stop_siblings() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Port 9 on localhost refuses connections, so that fetch fails
    mount_html(
        &mock_server,
        "/",
        format!(
            r#"<a href="http://127.0.0.1:9/dead">dead</a>
               <a href="{}/alive">alive</a>"#,
            base_url
        ),
        1,
    )
    .await;

    mount_html(
        &mock_server,
        "/alive",
        r#"<a href="http://127.0.0.1:9/dead">dead again</a>"#.to_string(),
        1,
    )
    .await;

    let (sink, pages) = recording_sink();
    let summary = crawl(&test_config(), vec![format!("{}/", base_url)], sink)
        .await
        .expect("Crawl failed");

    assert_eq!(summary.tasks_spawned, 3);
    assert_eq!(summary.tasks_succeeded, 2);
    assert_eq!(summary.tasks_failed, 1);
    assert!(summary.seen.contains("http://127.0.0.1:9/dead"));
    assert_eq!(pages.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_seed_isolated() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(&mock_server, "/ok", "<p>ok</p>".to_string(), 1).await;
    mount_html(&mock_server, "/ok2", "<p>ok2</p>".to_string(), 1).await;

    let (sink, _pages) = recording_sink();
    let summary = crawl(
        &test_config(),
        vec![
            format!("{}/ok", base_url),
            "://bad".to_string(),
            format!("{}/ok2", base_url),
        ],
        sink,
    )
    .await
    .expect("Crawl failed");

    assert_eq!(summary.tasks_spawned, 2);
    assert_eq!(summary.malformed_links, 1);
}

#[tokio::test]
async fn test_rejecting_sink_prunes_subtree() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/",
        r#"<a href="/child">child</a>"#.to_string(),
        1,
    )
    .await;
    // Never fetched: the index page's links are not reported
    mount_html(&mock_server, "/child", "<p>child</p>".to_string(), 0).await;

    let sink: Arc<dyn PageSink> = Arc::new(sink_fn(|_, _| anyhow::bail!("disk full")));
    let summary = crawl(&test_config(), vec![format!("{}/", base_url)], sink)
        .await
        .expect("Crawl failed");

    assert_eq!(summary.tasks_spawned, 1);
    assert_eq!(summary.tasks_failed, 1);
}

#[tokio::test]
async fn test_resident_coordinator_accepts_later_seeds() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/first",
        r#"<a href="/shared">shared</a>"#.to_string(),
        1,
    )
    .await;
    mount_html(
        &mock_server,
        "/second",
        r#"<a href="/shared">shared</a>"#.to_string(),
        1,
    )
    .await;
    mount_html(&mock_server, "/shared", "<p>shared</p>".to_string(), 1).await;

    let config = test_config();
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config).unwrap());
    let handle = Coordinator::spawn(fetcher, &config.crawler);
    let (sink, _pages) = recording_sink();

    handle
        .visit([format!("{}/first", base_url)], Arc::clone(&sink))
        .unwrap();
    let first = handle.wait_idle().await.unwrap();
    assert_eq!(first.tasks_spawned, 2);

    handle
        .visit([format!("{}/second", base_url)], sink)
        .unwrap();
    let second = handle.wait_idle().await.unwrap();
    assert_eq!(second.tasks_spawned, 3);
    assert_eq!(second.duplicate_links, 1);

    let final_summary = handle.shutdown().await.unwrap();
    assert_eq!(final_summary.seen.len(), 3);
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_crawling() {
    let mock_server = MockServer::start().await;
    mount_html(&mock_server, "/", "<p>never</p>".to_string(), 0).await;

    let mut config = test_config();
    config.user_agent.crawler_name = "has spaces".to_string();

    let (sink, pages) = recording_sink();
    let result = crawl(&config, vec![format!("{}/", mock_server.uri())], sink).await;

    assert!(matches!(result, Err(CrawlError::Config(_))));
    assert!(pages.lock().unwrap().is_empty());
}
