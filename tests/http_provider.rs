//! Drives the HTTP providers against an in-process fake chat completions server.

mod common;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use common::{config_in, generation};
use nl_sql::config::AppConfig;
use nl_sql::llm::LlmManager;
use nl_sql::pipeline::Pipeline;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Received {
    headers: HeaderMap,
    query: HashMap<String, String>,
    body: Value,
}

#[derive(Clone, Default)]
struct FakeService {
    statuses: Arc<Mutex<VecDeque<StatusCode>>>,
    content: Arc<Mutex<String>>,
    received: Arc<Mutex<Vec<Received>>>,
}

impl FakeService {
    fn answering(content: String) -> Self {
        let service = Self::default();
        *service.content.lock().unwrap() = content;
        service
    }

    fn then_status(self, status: StatusCode) -> Self {
        self.statuses.lock().unwrap().push_back(status);
        self
    }

    fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

async fn chat_completions(
    State(service): State<FakeService>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    service.received.lock().unwrap().push(Received {
        headers,
        query,
        body,
    });

    let status = service
        .statuses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or(StatusCode::OK);
    if !status.is_success() {
        return (status, Json(json!({"error": {"message": "simulated failure"}}))).into_response();
    }

    let content = service.content.lock().unwrap().clone();
    Json(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content, "refusal": null},
            "finish_reason": "stop"
        }]
    }))
    .into_response()
}

async fn spawn(service: FakeService) -> String {
    let router = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route(
            "/openai/deployments/{deployment}/chat/completions",
            post(chat_completions),
        )
        .with_state(service);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

fn pipeline(config: AppConfig) -> Pipeline {
    let llm = LlmManager::new(&config.llm).unwrap();
    Pipeline::new(Arc::new(config), Arc::new(llm))
}

fn openai_config(dir: &std::path::Path, base_url: &str) -> AppConfig {
    let mut config = config_in(dir);
    config.llm.backend = "openai".to_string();
    config.llm.api_key = Some("sk-test".to_string());
    config.llm.api_url = Some(format!("{}/v1/chat/completions", base_url));
    config.llm.retry_backoff_ms = 10;
    config
}

#[tokio::test]
async fn openai_request_carries_structured_output_contract() {
    let dir = tempfile::tempdir().unwrap();
    let service = FakeService::answering(generation("SELECT COUNT(*) FROM orders"));
    let base_url = spawn(service.clone()).await;

    let answer = pipeline(openai_config(dir.path(), &base_url))
        .answer_question("How many orders are there?")
        .await;
    assert_eq!(answer, "SELECT COUNT(*) FROM orders");

    let received = service.received();
    assert_eq!(received.len(), 1);

    let request = &received[0];
    assert_eq!(request.headers["authorization"], "Bearer sk-test");
    assert_eq!(request.body["model"], "gpt-4o");
    assert!((request.body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert_eq!(request.body["response_format"]["type"], "json_schema");
    assert_eq!(request.body["response_format"]["json_schema"]["strict"], true);

    let messages = request.body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["role"], "user");
}

#[tokio::test]
async fn server_errors_are_retried() {
    let dir = tempfile::tempdir().unwrap();
    let service = FakeService::answering(generation("SELECT 1"))
        .then_status(StatusCode::SERVICE_UNAVAILABLE)
        .then_status(StatusCode::BAD_GATEWAY);
    let base_url = spawn(service.clone()).await;

    let answer = pipeline(openai_config(dir.path(), &base_url))
        .answer_question("Anything?")
        .await;

    assert_eq!(answer, "SELECT 1");
    assert_eq!(service.received().len(), 3);
}

#[tokio::test]
async fn retries_are_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let service = FakeService::answering(generation("SELECT 1"))
        .then_status(StatusCode::SERVICE_UNAVAILABLE)
        .then_status(StatusCode::SERVICE_UNAVAILABLE)
        .then_status(StatusCode::SERVICE_UNAVAILABLE);
    let base_url = spawn(service.clone()).await;

    let mut config = openai_config(dir.path(), &base_url);
    config.llm.max_retries = 1;
    let answer = pipeline(config).answer_question("Anything?").await;

    assert!(answer.starts_with("OpenAI API error : API responded with status code: 503"));
    assert_eq!(service.received().len(), 2);
}

#[tokio::test]
async fn client_errors_fail_without_retry() {
    let dir = tempfile::tempdir().unwrap();
    let service = FakeService::answering(generation("SELECT 1")).then_status(StatusCode::UNAUTHORIZED);
    let base_url = spawn(service.clone()).await;

    let answer = pipeline(openai_config(dir.path(), &base_url))
        .answer_question("Anything?")
        .await;

    assert!(answer.starts_with("OpenAI API error : API responded with status code: 401"));
    assert!(answer.contains("simulated failure"));
    assert_eq!(service.received().len(), 1);
}

#[tokio::test]
async fn unreachable_endpoint_is_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();

    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let mut config = openai_config(dir.path(), &base_url);
    config.llm.max_retries = 0;
    let answer = pipeline(config).answer_question("Anything?").await;

    assert!(answer.starts_with("OpenAI API error : "));
}

#[tokio::test]
async fn azure_uses_deployment_path_and_api_key_header() {
    let dir = tempfile::tempdir().unwrap();
    let service = FakeService::answering(generation("SELECT 1"));
    let base_url = spawn(service.clone()).await;

    let mut config = config_in(dir.path());
    config.llm.backend = "azure".to_string();
    config.llm.api_key = Some("azure-key".to_string());
    config.llm.azure_endpoint = Some(base_url);
    config.llm.deployment = Some("gpt-4o-prod".to_string());
    config.llm.api_version = Some("2024-06-01".to_string());

    let answer = pipeline(config).answer_question("Anything?").await;
    assert_eq!(answer, "SELECT 1");

    let request = &service.received()[0];
    assert_eq!(request.headers["api-key"], "azure-key");
    assert_eq!(request.query["api-version"], "2024-06-01");
    assert!(request.body.get("model").is_none());
}
