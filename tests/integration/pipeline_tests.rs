//! Integration tests for the extraction pipeline
//!
//! These tests use wiremock to stand in for VC portfolio pages and the
//! chat-completions provider, and tempfile for configs and CSV sinks.

use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use vc_harvester::config::{load_config, Config};
use vc_harvester::crawler::{build_http_client, Coordinator, FetchError, FetchPolicy, Fetcher};
use vc_harvester::extraction::{Extractor, OpenAiExtractor};
use vc_harvester::output::{CsvSink, RecordSink};
use vc_harvester::record::{RawPayload, Validator};
use vc_harvester::state::TaskStage;
use vc_harvester::HarvestError;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HEADER: [&str; 7] = ["url", "name", "description", "source", "country", "city", "email"];

/// Writes a config file pointing the provider at `api_base`
fn create_test_config(api_base: &str, sink_path: &Path) -> (Config, NamedTempFile) {
    let content = format!(
        r#"
[fetcher]
timeout-secs = 5
max-attempts = 3
backoff-base-ms = 1

[user-agent]
crawler-name = "TestHarvester"
crawler-version = "1.0"
contact-url = "https://example.com/about"
contact-email = "admin@example.com"

[extraction]
api-base = "{}"
api-key-env = "VC_HARVESTER_INTEGRATION_UNSET_KEY"
max-retries = 3
timeout-secs = 5

[output]
sink-path = "{}"

[batch]
worker-limit = 10
"#,
        api_base,
        sink_path.display()
    );

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();

    let config = load_config(file.path()).expect("Failed to load test config");
    (config, file)
}

fn test_fetcher(config: &Config) -> Fetcher {
    Fetcher::from_config(&config.user_agent, &config.fetcher).expect("Failed to build fetcher")
}

fn test_extractor(config: &Config) -> OpenAiExtractor {
    OpenAiExtractor::new("test-key", &config.extraction)
        .expect("Failed to build extractor")
        .with_backoff_base(Duration::from_millis(1))
}

/// Reads every data row of a sink, checking the header on the way
fn read_rows(sink_path: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(sink_path).unwrap();
    assert_eq!(reader.headers().unwrap(), &csv::StringRecord::from(HEADER.to_vec()));
    reader.records().map(|r| r.unwrap()).collect()
}

/// Returns the same serialized record for every corpus
struct ScriptedExtractor {
    output: Option<String>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedExtractor {
    fn new(output: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            output: output.map(str::to_string),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(&self, _corpus: &str) -> Option<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.output.clone()
    }
}

fn chat_response(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    }))
}

/// Validates collaborator output for a seed and appends it to a fresh sink
fn validate_and_persist(seed: &str, raw: &str) -> csv::StringRecord {
    let dir = TempDir::new().unwrap();
    let sink_path = dir.path().join("companies.csv");
    let sink = CsvSink::open(&sink_path).unwrap();

    let payload = RawPayload::parse(raw).unwrap();
    let record = Validator::default().validate(payload, seed).unwrap();
    sink.persist(&record).unwrap();

    let mut rows = read_rows(&sink_path);
    assert_eq!(rows.len(), 1);
    rows.remove(0)
}

#[test]
fn test_amphista_record_is_persisted_whole() {
    let row = validate_and_persist(
        "https://www.nvfund.com/portfolio/amphista",
        "{'url': 'https://www.amphista.com', 'name': 'Amphista Therapeutics', \
         'description': 'Targeted protein degradation', 'country': 'United Kingdom', \
         'city': 'London', 'email': None}",
    );

    assert_eq!(&row[0], "https://www.amphista.com");
    assert_eq!(&row[1], "Amphista Therapeutics");
    assert_eq!(&row[3], "https://www.nvfund.com/portfolio/amphista");
    assert_eq!(&row[4], "United Kingdom");
    assert_eq!(&row[6], "");
}

#[test]
fn test_vc_email_is_discarded() {
    let row = validate_and_persist(
        "https://btn.vc/portfolio/hivewealth-2/",
        "{'url': 'https://hivewealth.com', 'name': 'Hive Wealth', 'email': 'info@btn.vc'}",
    );

    assert_eq!(&row[0], "https://hivewealth.com");
    assert_eq!(&row[3], "https://btn.vc/portfolio/hivewealth-2/");
    assert_eq!(&row[6], "");
}

#[test]
fn test_self_referential_url_is_discarded() {
    let row = validate_and_persist(
        "https://www.dcvc.com/companies/platfora/",
        "{'url': 'https://www.dcvc.com/companies/platfora/', 'name': 'Platfora', \
         'description': 'Big data analytics'}",
    );

    assert_eq!(&row[0], "");
    assert_eq!(&row[1], "Platfora");
    assert_eq!(&row[3], "https://www.dcvc.com/companies/platfora/");
}

#[tokio::test]
async fn test_pipeline_with_provider_end_to_end() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let sink_path = dir.path().join("companies.csv");
    let (config, _file) = create_test_config(&format!("{}/v1", server.uri()), &sink_path);

    Mock::given(method("GET"))
        .and(path("/portfolio/amphista"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><script>track();</script></head><body>
            <header><a href="/">Home</a></header>
            <h1>Amphista Therapeutics</h1>
            <p>Based in London.</p>
            <a href="https://www.amphista.com">Website</a>
            <footer>© NV Fund</footer>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(chat_response(
            "```python\n{'url': 'https://www.amphista.com', 'name': 'Amphista Therapeutics', \
             'description': None, 'country': ['United Kingdom'], 'city': 'London', 'email': None}\n```",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let sink = Arc::new(CsvSink::open(&sink_path).unwrap());
    let coordinator = Coordinator::new(
        test_fetcher(&config),
        Arc::new(test_extractor(&config)),
        sink,
        Validator::new(config.validation.host_match),
        config.batch.worker_limit as usize,
    );

    let seed = format!("{}/portfolio/amphista", server.uri());
    let report = coordinator.run_batch(vec![seed.clone()]).await;
    assert_eq!(report.persisted, 1);
    assert_eq!(report.total_failed(), 0);

    let rows = read_rows(&sink_path);
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "https://www.amphista.com");
    assert_eq!(&rows[0][1], "Amphista Therapeutics");
    assert_eq!(&rows[0][2], "");
    assert_eq!(&rows[0][3], seed.as_str());
    assert_eq!(&rows[0][4], "United Kingdom");
    assert_eq!(&rows[0][5], "London");
}

#[tokio::test]
async fn test_fields_echoing_seed_host_are_dropped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let sink_path = dir.path().join("companies.csv");
    let (config, _file) = create_test_config(&format!("{}/v1", server.uri()), &sink_path);

    Mock::given(method("GET"))
        .and(path("/portfolio/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Acme Robotics</p>"))
        .mount(&server)
        .await;

    let raw = format!(
        "{{'url': '{}/portfolio/acme', 'name': 'Acme Robotics', \
         'email': 'info@127.0.0.1, founders@acme.io'}}",
        server.uri()
    );
    let sink = Arc::new(CsvSink::open(&sink_path).unwrap());
    let coordinator = Coordinator::new(
        test_fetcher(&config),
        ScriptedExtractor::new(Some(&raw)),
        sink,
        Validator::default(),
        2,
    );

    let record = coordinator
        .process_seed(&format!("{}/portfolio/acme", server.uri()))
        .await
        .unwrap();
    assert_eq!(record.url, None);
    assert_eq!(record.email.as_deref(), Some("founders@acme.io"));

    let rows = read_rows(&sink_path);
    assert_eq!(&rows[0][0], "");
    assert_eq!(&rows[0][6], "founders@acme.io");
}

#[tokio::test]
async fn test_fetch_retries_are_bounded() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, _file) = create_test_config("https://api.example.com/v1", &dir.path().join("c.csv"));

    Mock::given(method("GET"))
        .and(path("/unavailable"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = test_fetcher(&config);
    let err = fetcher
        .fetch(&format!("{}/unavailable", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Http { status: 503, .. }));
    assert_eq!(err.attempts(), 3);
}

/// Fetcher with a sub-second timeout, for exercising timeouts quickly
fn fast_fetcher(config: &Config, timeout: Duration) -> Fetcher {
    let client = build_http_client(&config.user_agent, timeout).expect("Failed to build client");
    Fetcher::new(
        client,
        FetchPolicy {
            timeout,
            max_attempts: 3,
            backoff_base: Duration::from_millis(1),
        },
    )
}

#[tokio::test]
async fn test_timeouts_are_retried_then_reported() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, _file) = create_test_config("https://api.example.com/v1", &dir.path().join("c.csv"));

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = fast_fetcher(&config, Duration::from_millis(100));
    let err = fetcher
        .fetch(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Timeout { .. }));
    assert_eq!(err.kind(), "timeout");
    assert_eq!(err.attempts(), 3);
}

#[tokio::test]
async fn test_refused_connections_are_retried_then_reported() {
    let dir = TempDir::new().unwrap();
    let (config, _file) = create_test_config("https://api.example.com/v1", &dir.path().join("c.csv"));

    // Nothing listens on port 1
    let fetcher = test_fetcher(&config);
    let err = fetcher.fetch("http://127.0.0.1:1/").await.unwrap_err();

    assert!(matches!(err, FetchError::Connection { .. }));
    assert_eq!(err.kind(), "connection");
    assert_eq!(err.attempts(), 3);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, _file) = create_test_config("https://api.example.com/v1", &dir.path().join("c.csv"));

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let sink = Arc::new(CsvSink::open(dir.path().join("c.csv")).unwrap());
    let coordinator = Coordinator::new(
        test_fetcher(&config),
        ScriptedExtractor::new(Some("{'name': 'Unused'}")),
        sink,
        Validator::default(),
        1,
    );

    let err = coordinator
        .process_seed(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.stage(), TaskStage::Fetch);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_batch_isolates_fetch_failures() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let sink_path = dir.path().join("companies.csv");
    let (config, _file) = create_test_config("https://api.example.com/v1", &sink_path);

    // Every tenth page always fails; registered first so they win over the catch-all
    for i in (0..50).step_by(10) {
        Mock::given(method("GET"))
            .and(path(format!("/portfolio/{}", i)))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<h1>Startup</h1><p>Builds robots.</p>"),
        )
        .mount(&server)
        .await;

    let extractor = ScriptedExtractor::new(Some(
        "{'url': 'https://startup.example', 'name': 'Startup', 'description': 'Builds robots'}",
    ));
    let sink = Arc::new(CsvSink::open(&sink_path).unwrap());
    let coordinator = Coordinator::new(
        test_fetcher(&config),
        extractor.clone(),
        sink,
        Validator::default(),
        10,
    );

    let seeds: Vec<String> = (0..50)
        .map(|i| format!("{}/portfolio/{}", server.uri(), i))
        .collect();
    let report = coordinator.run_batch(seeds).await;

    assert_eq!(report.submitted, 50);
    assert_eq!(report.persisted, 45);
    assert_eq!(report.failed_at(TaskStage::Fetch), 5);
    assert_eq!(report.total_failed(), 5);
    assert!(extractor.peak.load(Ordering::SeqCst) <= 10);

    let rows = read_rows(&sink_path);
    assert_eq!(rows.len(), 45);
    assert!(rows.iter().all(|row| row.len() == 7));
}

#[tokio::test]
async fn test_sink_header_written_once_across_runs() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let sink_path = dir.path().join("companies.csv");
    let (config, _file) = create_test_config("https://api.example.com/v1", &sink_path);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Acme Robotics</p>"))
        .mount(&server)
        .await;

    let seed = format!("{}/portfolio/acme", server.uri());
    for _ in 0..2 {
        let sink = Arc::new(CsvSink::open(&sink_path).unwrap());
        let coordinator = Coordinator::new(
            test_fetcher(&config),
            ScriptedExtractor::new(Some("{'name': 'Acme Robotics'}")),
            sink,
            Validator::default(),
            1,
        );
        coordinator.run_batch(vec![seed.clone()]).await;
    }

    // No cross-run dedup: the same seed appends twice under a single header
    let rows = read_rows(&sink_path);
    assert_eq!(rows.len(), 2);
    let content = std::fs::read_to_string(&sink_path).unwrap();
    assert_eq!(content.matches("url,name,description").count(), 1);
}

#[tokio::test]
async fn test_provider_transient_errors_are_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, _file) = create_test_config(&format!("{}/v1", server.uri()), &dir.path().join("c.csv"));

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_response("{'name': 'Acme'}"))
        .expect(1)
        .mount(&server)
        .await;

    let output = test_extractor(&config).extract("Acme Robotics").await;
    assert_eq!(output.as_deref(), Some("{'name': 'Acme'}"));
}

#[tokio::test]
async fn test_provider_retries_are_capped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, _file) = create_test_config(&format!("{}/v1", server.uri()), &dir.path().join("c.csv"));

    // One attempt plus three retries
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&server)
        .await;

    assert_eq!(test_extractor(&config).extract("Acme Robotics").await, None);
}

#[tokio::test]
async fn test_provider_auth_failure_is_not_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, _file) = create_test_config(&format!("{}/v1", server.uri()), &dir.path().join("c.csv"));

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(test_extractor(&config).extract("Acme Robotics").await, None);
}

#[tokio::test]
async fn test_empty_provider_content_is_absent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, _file) = create_test_config(&format!("{}/v1", server.uri()), &dir.path().join("c.csv"));

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(chat_response("   "))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(test_extractor(&config).extract("Acme Robotics").await, None);
}

#[test]
fn test_missing_api_key_is_a_setup_failure() {
    let dir = TempDir::new().unwrap();
    let (config, _file) = create_test_config("https://api.example.com/v1", &dir.path().join("c.csv"));

    let result = Coordinator::from_config(&config);
    assert!(matches!(result, Err(HarvestError::Provider(_))));
}
