//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small DTC site and run the full
//! warmup, discovery, fetch and output cycle against it.

use dtc_harvest::config::{parse_config, Config, FetcherConfig};
use dtc_harvest::crawler::{HarvestOptions, Harvester};
use dtc_harvest::fetcher::{
    build_fetcher, FetchError, Fetcher, HttpFetcher, HttpProfile, RetryPolicy,
    FALLBACK_USER_AGENTS,
};
use dtc_harvest::output::{build_sinks, HarvestRecord, MemorySink};
use dtc_harvest::storage::{open_storage, RunStatus, Storage};
use dtc_harvest::Chunk;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a zero-delay configuration pointing at the mock server
fn test_config(server: &MockServer, dir: &TempDir, extra_fetcher: &str) -> Config {
    let toml = format!(
        r#"
[harvest]
base-url = "{}"
namespaces = ["Land-Rover"]
delay = 0.0

[fetcher]
max-attempts = 2
timeout-secs = 5
{}

[output]
directory = "{}"
formats = ["jsonl", "csv", "sqlite"]
"#,
        server.uri(),
        extra_fetcher,
        dir.path().display().to_string().replace('\\', "/")
    );
    parse_config(&toml).expect("test config is valid")
}

fn http_fetcher(server: &MockServer, config: FetcherConfig, attempts: u32) -> HttpFetcher {
    HttpFetcher::new(
        &config,
        Url::parse(&server.uri()).unwrap(),
        RetryPolicy::new(attempts, Duration::ZERO),
        HttpProfile::Plain,
    )
    .unwrap()
}

fn detail_page(code: &str, definition: &str) -> String {
    format!(
        r#"<html><head><title>{code} | DTC Decode</title></head><body>
             <h1>{code} – {definition}</h1>
             <h2>Possible Causes</h2>
             <ul><li>Wiring harness</li><li>Connector corrosion</li></ul>
             <h3>Pinout</h3>
             <table><thead><tr><th>Pin</th><th>Signal</th></tr></thead>
               <tbody><tr><td>6</td><td>CAN-H</td></tr><tr><td>14</td><td>CAN-L</td><td>twisted</td></tr></tbody>
             </table>
           </body></html>"#
    )
}

async fn mount_page(server: &MockServer, at: &str, referer: Option<String>, body: String) {
    let mut mock = Mock::given(method("GET")).and(path(at));
    if let Some(referer) = referer {
        mock = mock.and(header("referer", referer.as_str()));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Two listing pages, five unique detail links, one of them always blocked
async fn mount_site(server: &MockServer) {
    let home = format!("{}/", server.uri());
    let root = format!("{}/Land-Rover", server.uri());

    mount_page(server, "/", None, "<html>home</html>".to_string()).await;
    mount_page(
        server,
        "/Land-Rover",
        Some(home.clone()),
        r#"<ul>
             <li><a href="/Land-Rover/P0300-00">P0300-00</a></li>
             <li><a href="/Land-Rover/P0301-00">P0301-00</a></li>
             <li><a href="/Land-Rover/C1A2B-11">C1A2B-11</a></li>
           </ul>
           <a href="/Land-Rover/page/2">Next</a>
           <a href="/Jaguar">Jaguar</a>"#
            .to_string(),
    )
    .await;
    mount_page(
        server,
        "/Land-Rover/page/2",
        Some(home),
        r#"<ul>
             <li><a href="/Land-Rover/p0301-00">p0301-00</a></li>
             <li><a href="/Land-Rover/U0100-87">U0100-87</a></li>
             <li><a href="/Land-Rover/B1318-16">B1318-16</a></li>
           </ul>
           <a href="/Land-Rover">First</a>"#
            .to_string(),
    )
    .await;

    for (code, definition) in [
        ("P0300-00", "Random Misfire Detected"),
        ("P0301-00", "Cylinder 1 Misfire Detected"),
        ("C1A2B-11", "Brake sensor circuit short to ground"),
        ("U0100-87", "Lost communication with ECM"),
    ] {
        mount_page(
            server,
            &format!("/Land-Rover/{}", code),
            Some(root.clone()),
            detail_page(code, definition),
        )
        .await;
    }

    Mock::given(method("GET"))
        .and(path("/Land-Rover/B1318-16"))
        .respond_with(ResponseTemplate::new(403))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_harvest_writes_every_output() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir, "");

    let fetcher = build_fetcher(&config).await.unwrap();
    let mut sinks = build_sinks(&config, "Land-Rover", "test-hash").unwrap();
    let mut harvester = Harvester::new(HarvestOptions::from_config(&config).unwrap(), fetcher);

    let summary = harvester
        .run("Land-Rover", &mut sinks, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.listing_pages, 2);
    assert_eq!(summary.detail_links, 5);
    assert_eq!(summary.records, 4);
    assert_eq!(summary.errors, 1);
    assert!(summary.is_complete());

    // JSON lines, in processing order (sorted case-insensitively)
    let jsonl = std::fs::read_to_string(dir.path().join("Land-Rover_dtcs.jsonl")).unwrap();
    let lines: Vec<serde_json::Value> = jsonl
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0]["url"].as_str().unwrap().ends_with("/Land-Rover/B1318-16"));
    assert!(lines[0]["error"].as_str().unwrap().contains("403"));
    let codes: Vec<_> = lines[1..].iter().map(|l| l["code"].as_str().unwrap()).collect();
    assert_eq!(codes, vec!["C1A2B-11", "P0300-00", "P0301-00", "U0100-87"]);
    assert_eq!(lines[1]["canonical_triplet"], "1A 2B 11");

    // aggregate array mirrors the stream
    let aggregate: Vec<serde_json::Value> = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("Land-Rover_dtcs.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(aggregate, lines);

    // wide CSV: header plus one row per link
    let wide = std::fs::read_to_string(dir.path().join("Land-Rover_dtcs_with_hex.csv")).unwrap();
    assert_eq!(wide.lines().count(), 6);

    // table files numbered per code, padded to the grown header
    let table = std::fs::read_to_string(
        dir.path()
            .join("tables")
            .join("Land-Rover")
            .join("P0300-00")
            .join("table_1.csv"),
    )
    .unwrap();
    let rows: Vec<&str> = table.lines().collect();
    assert_eq!(rows, vec!["Pin,Signal,col_2", "6,CAN-H,", "14,CAN-L,twisted"]);

    // SQLite run closed with the final counts
    let storage = open_storage(&dir.path().join("harvest.db")).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.namespace, "Land-Rover");
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(storage.count_records(run.id).unwrap(), 4);
    assert_eq!(storage.count_errors(run.id).unwrap(), 1);
}

#[tokio::test]
async fn test_detail_record_end_to_end() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir, "");

    let fetcher = build_fetcher(&config).await.unwrap();
    let mut sink = MemorySink::new();
    let mut harvester = Harvester::new(HarvestOptions::from_config(&config).unwrap(), fetcher);
    harvester
        .run("Land-Rover", &mut sink, &CancellationToken::new())
        .await
        .unwrap();

    let records = sink.snapshot();
    let record = records
        .iter()
        .find_map(|r| match r {
            HarvestRecord::Detail(d) if d.code == "P0300-00" => Some(d.clone()),
            _ => None,
        })
        .expect("P0300-00 was harvested");

    assert_eq!(record.base_code.as_deref(), Some("P0300"));
    assert_eq!(record.fault_suffix.as_deref(), Some("00"));
    assert_eq!(record.definition.as_deref(), Some("Random Misfire Detected"));
    assert_eq!(record.sections.len(), 2);
    assert_eq!(record.sections[0].title, "Possible Causes");
    assert_eq!(record.sections[0].order_index, 0);
    assert!(matches!(&record.sections[0].chunks[0], Chunk::ListBlock { items } if items.len() == 2));
    assert_eq!(record.sections[1].order_index, 1);
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let fetcher = http_fetcher(&server, FetcherConfig::default(), 5);
    let body = fetcher
        .get(&format!("{}/flaky", server.uri()), None)
        .await
        .unwrap();

    assert_eq!(body, "ok");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    assert_eq!(fetcher.identity().current(), FALLBACK_USER_AGENTS[0]);
}

#[tokio::test]
async fn test_blocked_request_rotates_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/guarded"))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/guarded"))
        .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
        .mount(&server)
        .await;

    let fetcher = http_fetcher(&server, FetcherConfig::default(), 5);
    let body = fetcher
        .get(&format!("{}/guarded", server.uri()), None)
        .await
        .unwrap();

    assert_eq!(body, "welcome");
    assert_eq!(fetcher.identity().current(), FALLBACK_USER_AGENTS[1]);
}

#[tokio::test]
async fn test_exhausted_attempts_surface_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = http_fetcher(&server, FetcherConfig::default(), 3);
    let result = fetcher.get(&format!("{}/busy", server.uri()), None).await;

    assert!(matches!(
        result,
        Err(FetchError::RateLimited { status: 429, .. })
    ));
}

#[tokio::test]
async fn test_seeded_cookies_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/members"))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello member"))
        .mount(&server)
        .await;

    let config = FetcherConfig {
        cookies: Some("session=abc123".to_string()),
        ..FetcherConfig::default()
    };
    let fetcher = http_fetcher(&server, config, 1);

    let body = fetcher
        .get(&format!("{}/members", server.uri()), None)
        .await
        .unwrap();
    assert_eq!(body, "hello member");
}

#[tokio::test]
async fn test_custom_user_agent_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "HarvestTest/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hi"))
        .mount(&server)
        .await;

    let config = FetcherConfig {
        user_agent: Some("HarvestTest/1.0".to_string()),
        ..FetcherConfig::default()
    };
    let fetcher = http_fetcher(&server, config, 1);

    assert!(fetcher.get(&format!("{}/", server.uri()), None).await.is_ok());
}

#[tokio::test]
async fn test_stealth_profile_sends_fetch_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("sec-fetch-mode", "navigate"))
        .and(header("sec-fetch-site", "none"))
        .and(header_exists("sec-ch-ua"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hi"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir, r#"kind = "stealth""#);
    let fetcher = build_fetcher(&config).await.unwrap();

    assert!(fetcher.get(&format!("{}/", server.uri()), None).await.is_ok());
}

#[tokio::test]
async fn test_cancelled_run_still_finishes_outputs() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let dir = TempDir::new().unwrap();
    let config = test_config(&server, &dir, "");

    let fetcher = build_fetcher(&config).await.unwrap();
    let mut sinks = build_sinks(&config, "Land-Rover", "test-hash").unwrap();
    let mut harvester = Harvester::new(HarvestOptions::from_config(&config).unwrap(), fetcher);

    let token = CancellationToken::new();
    token.cancel();
    let summary = harvester.run("Land-Rover", &mut sinks, &token).await.unwrap();

    assert!(summary.interrupted);
    assert!(dir.path().join("Land-Rover_dtcs.json").exists());

    let storage = open_storage(&dir.path().join("harvest.db")).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Interrupted);
}
