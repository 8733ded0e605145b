#![allow(dead_code)]

use async_trait::async_trait;
use nl_sql::config::AppConfig;
use nl_sql::llm::{ChatModel, LlmError, LlmManager};
use nl_sql::pipeline::Pipeline;
use nl_sql::prompts::PromptMessage;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const SCHEMA: &str = "erDiagram\n    customers ||--o{ orders : places\n    orders ||--|{ order_items : contains\n";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<PromptMessage>,
    pub temperature: f32,
    pub response_format: Value,
}

/// Chat model that replays queued replies and records every call.
#[derive(Clone, Default)]
pub struct ScriptedModel {
    replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedModel {
    pub fn reply(self, content: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(content.into()));
        self
    }

    pub fn fail(self, detail: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Err(detail.into()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        temperature: f32,
        response_format: &Value,
    ) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            temperature,
            response_format: response_format.clone(),
        });

        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(content)) => Ok(content),
            Some(Err(detail)) => Err(LlmError::ConnectionError(detail)),
            None => Err(LlmError::ResponseError("no scripted reply left".to_string())),
        }
    }
}

/// Config whose schema file lives in `dir`.
pub fn config_in(dir: &Path) -> AppConfig {
    let schema_path = dir.join("schema.txt");
    std::fs::write(&schema_path, SCHEMA).unwrap();

    let mut config = AppConfig::default();
    config.paths.schema_path = schema_path.to_string_lossy().to_string();
    config.paths.db_path = dir.join("olist.duckdb").to_string_lossy().to_string();
    config.paths.log_file = None;
    config
}

pub fn pipeline_with(config: AppConfig, model: &ScriptedModel) -> Pipeline {
    Pipeline::new(
        Arc::new(config),
        Arc::new(LlmManager::with_model(Box::new(model.clone()))),
    )
}

pub fn generation(query: &str) -> String {
    serde_json::json!({
        "steps": [{"explanation": "Aggregate order totals per customer", "output": query}],
        "query": query,
    })
    .to_string()
}
