use crate::config::LlmConfig;
use crate::llm::providers::transport::{ChatRequest, ChatTransport, Credential};
use crate::llm::{ChatModel, LlmError};
use crate::prompts::PromptMessage;
use async_trait::async_trait;
use serde_json::Value;

pub const DEFAULT_API_VERSION: &str = "2024-08-01-preview";

/// Azure OpenAI deployment; the deployment name selects the model.
pub struct AzureOpenAiProvider {
    transport: ChatTransport,
    url: String,
    api_key: String,
}

impl AzureOpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let endpoint = config.azure_endpoint.as_deref().ok_or_else(|| {
            LlmError::ConfigError("Azure endpoint is required for the azure backend".to_string())
        })?;

        let api_key = config.api_key.clone().ok_or_else(|| {
            LlmError::ConfigError("API key is required for the azure backend".to_string())
        })?;

        let deployment = config.deployment.as_deref().unwrap_or(&config.model);
        let api_version = config.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION);

        Ok(Self {
            transport: ChatTransport::new(config)?,
            url: deployment_url(endpoint, deployment, api_version),
            api_key,
        })
    }
}

pub fn deployment_url(endpoint: &str, deployment: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        endpoint.trim_end_matches('/'),
        deployment,
        api_version
    )
}

#[async_trait]
impl ChatModel for AzureOpenAiProvider {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        temperature: f32,
        response_format: &Value,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: None,
            messages,
            temperature,
            response_format,
        };

        self.transport
            .send(&self.url, &Credential::ApiKey(&self.api_key), &request)
            .await
    }
}
