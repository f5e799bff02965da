// Tests for KmaSnowFetcher against a mocked KMA API hub
// Uses mockito for HTTP mocking

use std::io::Write;
use std::time::Duration;

use chrono::NaiveDate;
use mockito::{Matcher, Server};
use snow_depth_service::fetch_error::FetchError;
use snow_depth_service::fetcher::{KmaSnowFetcher, SnowSource};
use snow_depth_service::models::{HourSlot, MetricKind, Reading};

const SNOW_PATH: &str = "/kma_snow1.php";

fn create_test_fetcher(base_url: String) -> KmaSnowFetcher {
    KmaSnowFetcher::new(
        format!("{base_url}{SNOW_PATH}"),
        "test-key".to_string(),
        Duration::from_secs(3),
    )
    .expect("Failed to build fetcher")
}

fn slot(hour: u32) -> HourSlot {
    HourSlot::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), hour).unwrap()
}

fn stations() -> Vec<String> {
    vec!["140".to_string(), "886".to_string()]
}

#[tokio::test]
async fn test_fetch_sends_expected_query() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", SNOW_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("sd".into(), "day".into()),
            Matcher::UrlEncoded("tm".into(), "202401010700".into()),
            Matcher::UrlEncoded("help".into(), "0".into()),
            Matcher::UrlEncoded("authKey".into(), "test-key".into()),
        ]))
        .with_status(200)
        .with_body("#START7777\n202401010700,140,1.5,=\n")
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url());
    let readings = fetcher.fetch(slot(7), MetricKind::NewSnow, &stations()).await;

    assert_eq!(readings.len(), 2);
    assert_eq!(readings["140"], Reading::Value("1.5".to_string()));
    assert_eq!(readings["886"], Reading::NoData);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_parses_all_requested_stations() {
    let mut server = Server::new_async().await;

    let body = "\
# YYMMDDHHMI,STN,SD_TOT,=
202401010000,   90,   0.0,=
202401010000,  140,  12.3,=
202401010000,  886,   8.1,=
";
    let mock = server
        .mock("GET", SNOW_PATH)
        .match_query(Matcher::UrlEncoded("sd".into(), "tot".into()))
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body(body)
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url());
    let readings = fetcher.fetch(slot(0), MetricKind::TotalSnow, &stations()).await;

    assert_eq!(readings["140"].as_str(), "12.3");
    assert_eq!(readings["886"].as_str(), "8.1");
    assert!(!readings.contains_key("90"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_server_error_yields_no_data() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", SNOW_PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("t,140,9.9,=\n")
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url());
    let readings = fetcher.fetch(slot(3), MetricKind::TotalSnow, &stations()).await;

    assert_eq!(readings.len(), 2);
    assert!(readings.values().all(Reading::is_no_data));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_body_reports_status() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", SNOW_PATH)
        .match_query(Matcher::Any)
        .with_status(403)
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url());
    let result = fetcher.fetch_body(slot(3), MetricKind::NewSnow).await;

    match result {
        Err(FetchError::Status(status)) => assert_eq!(status.as_u16(), 403),
        other => panic!("Expected status error, got {other:?}"),
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_connection_failure_yields_no_data() {
    // Nothing listens on port 1
    let fetcher = create_test_fetcher("http://127.0.0.1:1".to_string());
    let readings = fetcher.fetch(slot(0), MetricKind::TotalSnow, &stations()).await;

    assert_eq!(readings.len(), 2);
    assert!(readings.values().all(Reading::is_no_data));
}

#[tokio::test]
async fn test_fetch_empty_body_yields_no_data() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", SNOW_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("#START7777\n#7777END\n")
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url());
    let readings = fetcher.fetch(slot(0), MetricKind::NewSnow, &stations()).await;

    assert!(readings.values().all(Reading::is_no_data));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_timeout_yields_no_data() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", SNOW_PATH)
        .match_query(Matcher::UrlEncoded("sd".into(), "tot".into()))
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(1000));
            w.write_all(b"202401010300,140,4.0,=\n")
        })
        .create_async()
        .await;

    let fetcher = KmaSnowFetcher::new(
        format!("{}{SNOW_PATH}", server.url()),
        "test-key".to_string(),
        Duration::from_millis(300),
    )
    .expect("Failed to build fetcher");
    let readings = fetcher.fetch(slot(3), MetricKind::TotalSnow, &stations()).await;

    assert_eq!(readings.len(), 2);
    assert!(readings.values().all(Reading::is_no_data));

    mock.assert_async().await;
}
