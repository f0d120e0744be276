//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive the real
//! HTTP fetcher through the full crawl cycle end-to-end.

use catalog_crawler::config::{parse_config, Config};
use catalog_crawler::crawler::{run_crawl, Coordinator, HttpFetcher, Traversal};
use catalog_crawler::output::{EntrySink, LineWriter};
use catalog_crawler::url::SiteScope;
use catalog_crawler::ConfigError;
use futures::StreamExt;
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::FileOptions;
use zip::ZipWriter;

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, max_depth: u32, max_items: usize, entries_path: &str) -> Config {
    let host = server.uri().trim_start_matches("http://").to_string();
    parse_config(&format!(
        r#"
[site]
scheme = "http"
host = "{host}"
allowed-prefixes = ["/apk"]
leaf-suffix = "/download/"
download-handler-path = "/download.php"
download-id-param = "id"

[crawler]
root-path = "/apk/"
max-depth = {max_depth}
max-items = {max_items}
max-retries = 3
request-timeout-secs = 5
retry-delay-ms = 0

[http]
require-proxies = false

[output]
entries-path = "{entries_path}"
"#
    ))
    .expect("Failed to parse test config")
}

fn traversal(config: &Config) -> Traversal<HttpFetcher> {
    let fetcher = HttpFetcher::new(&config.http, Duration::from_secs(5)).expect("Failed to build fetcher");
    let scope = SiteScope::from_config(&config.site).expect("Failed to build scope");
    Traversal::new(Arc::new(fetcher), Arc::new(scope), &config.crawler)
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><head></head><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

fn leaf_page(server: &MockServer, id: u64) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            r#"<html><head><link rel="shortlink" href="{}/?p={}" /></head><body>Download</body></html>"#,
            server.uri(),
            id
        ))
        .insert_header("content-type", "text/html")
}

fn build_zip(files: &[(&str, usize)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, size) in files {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(&vec![b'x'; *size]).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_root_with_three_leaves() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/apk/"))
        .respond_with(html(
            r#"<a href="/apk/a/download/">A</a>
               <a href="/apk/b/download/">B</a>
               <a href="/apk/c/download/">C</a>
               <a href="https://elsewhere.example/apk/d/">Foreign</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 0, 100, "unused.txt");
    let nodes: Vec<_> = traversal(&config).into_stream().collect().await;

    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].path(), "/apk/");
    assert_eq!(nodes[0].leaf_links().len(), 3);
    assert!(nodes[0].container_links().is_empty());
}

#[tokio::test]
async fn test_self_link_fetched_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/apk/"))
        .respond_with(html(
            &format!(r#"<a href="/apk/">Home</a><a href="{}/apk/">Again</a>"#, mock_server.uri()),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 5, 100, "unused.txt");
    let nodes: Vec<_> = traversal(&config).into_stream().collect().await;

    assert_eq!(nodes.len(), 1);
}

#[tokio::test]
async fn test_page_recovers_after_two_failures() {
    let mock_server = MockServer::start().await;

    // First two requests fail, then the page is served normally
    Mock::given(method("GET"))
        .and(path("/apk/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/apk/"))
        .respond_with(html(r#"<a href="/apk/x/download/">X</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 3, 100, "unused.txt");
    let mut engine = traversal(&config);

    let node = engine.next_node().await.expect("root should be yielded");
    assert_eq!(node.retries(), 2);
    assert_eq!(node.leaf_links().len(), 1);
    assert!(engine.next_node().await.is_none());
    assert_eq!(engine.stats().retries, 2);
}

#[tokio::test]
async fn test_page_abandoned_after_retry_ceiling() {
    let mock_server = MockServer::start().await;

    // One attempt plus three retries
    Mock::given(method("GET"))
        .and(path("/apk/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 3, 100, "unused.txt");
    let mut engine = traversal(&config);

    assert!(engine.next_node().await.is_none());
    assert_eq!(engine.stats().pages_abandoned, 1);
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/apk/"))
        .respond_with(html(r#"<a href="/apk/level1/">L1</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/apk/level1/"))
        .respond_with(html(r#"<a href="/apk/level2/">L2</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Beyond max depth: must never be requested
    Mock::given(method("GET"))
        .and(path("/apk/level2/"))
        .respond_with(html(""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 1, 100, "unused.txt");
    let nodes: Vec<_> = traversal(&config).into_stream().collect().await;

    let depths: Vec<_> = nodes.iter().map(|n| (n.path().to_string(), n.depth())).collect();
    assert_eq!(
        depths,
        vec![("/apk/".to_string(), 0), ("/apk/level1/".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_leaf_without_identifier_is_skipped() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let entries_path = temp_dir.path().join("files.txt");

    Mock::given(method("GET"))
        .and(path("/apk/"))
        .respond_with(html(
            r#"<a href="/apk/broken/download/">Broken</a><a href="/apk/good/download/">Good</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/apk/broken/download/"))
        .respond_with(html("no shortlink on this page"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/apk/good/download/"))
        .respond_with(leaf_page(&mock_server, 77))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/download.php"))
        .and(query_param("id", "77"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(build_zip(&[("assets/model.binaryproto", 64)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 2, 100, entries_path.to_str().unwrap());
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");

    let mut sink = LineWriter::new(Vec::new());
    let stats = coordinator.run(&mut sink).await.expect("Crawl should complete");
    sink.flush().unwrap();

    assert_eq!(stats.leaves_attempted, 2);
    assert_eq!(stats.leaves_failed, 1);
    assert_eq!(stats.entries_written, 1);

    let output = String::from_utf8(sink.into_inner()).unwrap();
    assert_eq!(output, "download.php – assets/model.binaryproto – application/binaryproto – 64\n");
}

#[tokio::test]
async fn test_full_pipeline_appends_entries() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let entries_path = temp_dir.path().join("files.txt");
    std::fs::write(&entries_path, "earlier run\n").unwrap();

    Mock::given(method("GET"))
        .and(path("/apk/"))
        .respond_with(html(r#"<a href="/apk/vendor/">Vendor</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/apk/vendor/"))
        .respond_with(html(r#"<a href="app/app-1-0/download/">Get</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/apk/vendor/app/app-1-0/download/"))
        .respond_with(leaf_page(&mock_server, 4242))
        .mount(&mock_server)
        .await;

    // The download handler redirects to the named package
    Mock::given(method("GET"))
        .and(path("/download.php"))
        .and(query_param("id", "4242"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/files/app-1.0.apk", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/app-1.0.apk"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(build_zip(&[
            ("assets/config.json", 120),
            ("res/drawable/icon.png", 2048),
            ("assets/model.binaryproto", 10),
            ("META-INF/CERT", 7),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 3, 100, entries_path.to_str().unwrap());
    let stats = run_crawl(config).await.expect("Crawl should complete");

    assert_eq!(stats.pages_yielded, 2);
    assert_eq!(stats.leaves_attempted, 1);
    assert_eq!(stats.entries_written, 4);

    let content = std::fs::read_to_string(&entries_path).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "earlier run",
            "app-1.0.apk – assets/config.json – application/json – 120",
            "app-1.0.apk – res/drawable/icon.png – image/png – 2048",
            "app-1.0.apk – assets/model.binaryproto – application/binaryproto – 10",
            "app-1.0.apk – META-INF/CERT – application/octet-stream – 7",
        ]
    );
}

#[tokio::test]
async fn test_item_budget_limits_downloads() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/apk/"))
        .respond_with(html(
            r#"<a href="/apk/a/download/">A</a><a href="/apk/b/download/">B</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/apk/a/download/"))
        .respond_with(leaf_page(&mock_server, 1))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/apk/b/download/"))
        .respond_with(leaf_page(&mock_server, 2))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/download.php"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(build_zip(&[("a.txt", 1)])))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, 2, 1, "unused.txt");
    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let mut sink = LineWriter::new(Vec::new());
    let stats = coordinator.run(&mut sink).await.expect("Crawl should complete");

    assert!(stats.budget_exhausted);
    assert_eq!(stats.leaves_attempted, 1);
}

#[test]
fn test_required_proxies_missing_is_config_error() {
    let result = parse_config(
        r#"
[site]
host = "www.example.com"

[http]
proxies = []
"#,
    );

    assert!(matches!(result, Err(ConfigError::Validation(_))));
}
