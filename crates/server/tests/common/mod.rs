//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock LLM and a mock tracker injected, so the whole request path
//! (agent, triage, records) runs without external infrastructure.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use triage_core::{
    load_config_from_str,
    testing::{MockLlmClient, MockTicketClient},
    AgentRuntime, Config, DirectiveAgent, LlmClient, MetadataSynthesizer, RecordStore,
    RelatednessClassifier, SqliteRecordStore, TicketClient, ToolRegistry, TriageConfig,
    TriageOrchestrator, TriageTool,
};

/// Re-export fixtures for test convenience
pub use triage_core::testing::fixtures;

const TEST_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8000

[tracker]
url = "https://acme.atlassian.net"
project_key = "PROJ"
username = "bot@acme.test"
api_token = "jira-secret"

[llm]
provider = "open_ai"
model = "gpt-4o-mini"
api_key = "sk-secret"

[triage]
max_workers = 4
"#;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_agent_triage() {
///     let fixture = TestFixture::new();
///     fixture.seed(3);
///
///     let response = fixture.post("/api/v1/agent", json!({"request": "triage PROJ-1"})).await;
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock LLM - defaults to "unrelated" for every check
    pub llm: Arc<MockLlmClient>,
    /// Mock tracker - seed tickets and inspect links/comments
    pub tickets: Arc<MockTicketClient>,
    /// Temporary directory holding the record database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// Raw body, for non-JSON endpoints
    pub text: String,
}

impl TestFixture {
    /// Create a fixture backed by a SQLite file in a temp directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = SqliteRecordStore::new(&temp_dir.path().join("records.db"))
            .expect("Failed to create record store");
        Self::with_records(Arc::new(store), temp_dir)
    }

    /// Create a fixture with a custom record store.
    pub fn with_records(records: Arc<dyn RecordStore>, temp_dir: TempDir) -> Self {
        let config = test_config();

        let llm = Arc::new(MockLlmClient::with_default_response(fixtures::UNRELATED));
        llm.respond_when(
            |prompt| prompt.starts_with("<description>"),
            &fixtures::metadata_output("Medium"),
        );
        let tickets = Arc::new(MockTicketClient::new("PROJ"));

        let prompts = fixtures::prompt_library();
        let client: Arc<dyn LlmClient> = llm.clone();
        let orchestrator = Arc::new(TriageOrchestrator::new(
            RelatednessClassifier::new(Arc::new(
                prompts.relatedness_task(Arc::clone(&client), &config.llm),
            )),
            MetadataSynthesizer::new(Arc::new(prompts.metadata_task(client, &config.llm))),
            tickets.clone() as Arc<dyn TicketClient>,
            &TriageConfig {
                max_workers: Some(4),
            },
        ));

        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(TriageTool::new(Arc::clone(&orchestrator))));
        let agent: Arc<dyn AgentRuntime> = Arc::new(DirectiveAgent::new(tools));

        let state = Arc::new(triage_server::state::AppState::new(
            config,
            agent,
            orchestrator,
            records,
        ));
        let router = triage_server::api::create_router(state);

        Self {
            router,
            llm,
            tickets,
            temp_dir,
        }
    }

    /// Seed PROJ-1..=PROJ-n.
    pub fn seed(&self, n: usize) {
        for i in 1..=n {
            self.tickets
                .add_ticket(&format!("PROJ-{}", i), &format!("Ticket number {}", i));
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

pub fn test_config() -> Config {
    load_config_from_str(TEST_CONFIG).expect("Failed to parse test config")
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}
