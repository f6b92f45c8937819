//! End-to-end extraction tests over real HTTP
//!
//! These tests use wiremock to serve sites and run the full pipeline with
//! the real HTTP fetcher and the browser driver disabled.

use contact_harvest::config::{parse_config, Config};
use contact_harvest::output::{write_report, BatchStatistics, ReportFormat};
use contact_harvest::{extract_emails, HarvestError, ProgressState};
use std::collections::BTreeSet;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_only_config() -> Config {
    let mut config = Config::default();
    config.renderer.enabled = false;
    config
}

async fn serve(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_extraction_single_site() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        200,
        "<html><body>Write to info@shop.test</body></html>",
    )
    .await;
    serve(
        &server,
        "/contact",
        200,
        "<p>Sales: sales@shop.test, support: help@shop.test</p><p>info@shop.test</p>",
    )
    .await;
    serve(&server, "/about", 404, "hidden@shop.test").await;

    let progress = ProgressState::new();
    let results = extract_emails(http_only_config(), &[server.uri()], Some(&progress))
        .await
        .unwrap();

    let site = results.get(&server.uri()).unwrap();
    let expected: BTreeSet<String> = ["help@shop.test", "info@shop.test", "sales@shop.test"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(site.emails, expected);
    assert_eq!(site.error, None);
    assert_eq!(progress.snapshot().percentage, 100);
}

#[tokio::test]
async fn test_site_with_only_error_pages_has_no_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let results = extract_emails(http_only_config(), &[server.uri()], None)
        .await
        .unwrap();

    let site = results.get(&server.uri()).unwrap();
    assert!(site.emails.is_empty());
    assert!(!site.is_error());
}

#[tokio::test]
async fn test_mixed_batch_with_unreachable_site() {
    let server = MockServer::start().await;
    serve(&server, "/", 200, "hello@reachable.test").await;

    let closed_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let unreachable = format!("http://127.0.0.1:{}", closed_port);

    let progress = ProgressState::new();
    let results = extract_emails(
        http_only_config(),
        &[unreachable.clone(), server.uri()],
        Some(&progress),
    )
    .await
    .unwrap();

    assert!(results.get(&unreachable).unwrap().is_error());
    assert!(results
        .get(&server.uri())
        .unwrap()
        .emails
        .contains("hello@reachable.test"));
    assert_eq!(progress.processed(), 2);

    let stats = BatchStatistics::from_results(&results);
    assert_eq!(stats.failed_sites, 1);
    assert_eq!(stats.sites_with_emails, 1);

    let mut report = Vec::new();
    write_report(&results, ReportFormat::Rows, &mut report).unwrap();
    let report = String::from_utf8(report).unwrap();
    assert!(report.contains(&format!("{},No emails found", unreachable)));
    assert!(report.contains("hello@reachable.test"));
}

#[tokio::test]
async fn test_custom_candidate_catalog_from_config() {
    let server = MockServer::start().await;
    serve(&server, "/", 200, "").await;
    serve(&server, "/impressum", 200, "legal@firma.test").await;
    serve(&server, "/contact", 200, "skipped@firma.test").await;

    let config = parse_config(
        r#"
[renderer]
enabled = false

[pages]
candidates = ["impressum"]
"#,
    )
    .unwrap();

    let results = extract_emails(config, &[server.uri()], None).await.unwrap();

    let emails = &results.get(&server.uri()).unwrap().emails;
    assert!(emails.contains("legal@firma.test"));
    assert!(!emails.contains("skipped@firma.test"));
}

#[tokio::test]
async fn test_invalid_config_fails_before_fetching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x@never.test"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = http_only_config();
    config.fetch.timeout_secs = 0;

    let err = extract_emails(config, &[server.uri()], None).await.unwrap_err();
    assert!(matches!(err, HarvestError::Config(_)));
    assert!(err.to_string().contains("timeout-secs"));
}
