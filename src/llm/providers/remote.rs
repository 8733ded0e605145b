use crate::config::LlmConfig;
use crate::llm::providers::transport::{ChatRequest, ChatTransport, Credential};
use crate::llm::{ChatModel, LlmError};
use crate::prompts::PromptMessage;
use async_trait::async_trait;
use serde_json::Value;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible chat completions endpoint authenticated with a bearer key.
pub struct RemoteLlmProvider {
    transport: ChatTransport,
    api_url: String,
    api_key: String,
    model: String,
}

impl RemoteLlmProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            LlmError::ConfigError("API key is required for remote LLM provider".to_string())
        })?;

        let api_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            transport: ChatTransport::new(config)?,
            api_url,
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl ChatModel for RemoteLlmProvider {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        temperature: f32,
        response_format: &Value,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: Some(self.model.as_str()),
            messages,
            temperature,
            response_format,
        };

        self.transport
            .send(&self.api_url, &Credential::Bearer(&self.api_key), &request)
            .await
    }
}
