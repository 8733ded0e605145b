pub mod models;
pub mod providers;

use crate::config::LlmConfig;
use crate::db::category_translations::CategoryTranslationMap;
use crate::prompts::{render_category_prompt, PromptError, PromptMessage};
use crate::util::text::strip_code_fence;
use async_trait::async_trait;
use models::{CategoryExpansion, GenerationResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::error::Error;
use std::fmt;
use tracing::{debug, error, info};

#[derive(Debug)]
pub enum LlmError {
    ConnectionError(String),
    ResponseError(String),
    ConfigError(String),
}

impl LlmError {
    /// The message without the category prefix.
    pub fn detail(&self) -> &str {
        match self {
            LlmError::ConnectionError(msg)
            | LlmError::ResponseError(msg)
            | LlmError::ConfigError(msg) => msg,
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ConnectionError(msg) => write!(f, "LLM connection error: {}", msg),
            LlmError::ResponseError(msg) => write!(f, "LLM response error: {}", msg),
            LlmError::ConfigError(msg) => write!(f, "LLM configuration error: {}", msg),
        }
    }
}

impl Error for LlmError {}

impl From<PromptError> for LlmError {
    fn from(err: PromptError) -> Self {
        LlmError::ConfigError(err.to_string())
    }
}

/// A chat-completion backend that honours a structured `response_format`.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Name used as the marker in user-facing error strings.
    fn service_name(&self) -> &str {
        "OpenAI API"
    }

    /// Sends the messages and returns the raw content of the first choice.
    async fn complete(
        &self,
        messages: &[PromptMessage],
        temperature: f32,
        response_format: &Value,
    ) -> Result<String, LlmError>;
}

pub struct LlmManager {
    model: Box<dyn ChatModel>,
}

impl LlmManager {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let model: Box<dyn ChatModel> = match config.backend.as_str() {
            "openai" | "remote" => Box::new(providers::remote::RemoteLlmProvider::new(config)?),
            "azure" => Box::new(providers::azure::AzureOpenAiProvider::new(config)?),
            _ => {
                return Err(LlmError::ConfigError(format!(
                    "Unsupported LLM backend: {}",
                    config.backend
                )))
            }
        };

        Ok(Self { model })
    }

    pub fn with_model(model: Box<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub fn service_name(&self) -> &str {
        self.model.service_name()
    }

    /// Renders an error as `"<service> error : <detail>"`.
    pub fn error_message(&self, err: &LlmError) -> String {
        format!("{} error : {}", self.service_name(), err.detail())
    }

    /// Runs the SQL generation call and validates the structured result.
    pub async fn generate(
        &self,
        messages: &[PromptMessage],
        temperature: f32,
    ) -> Result<GenerationResult, LlmError> {
        info!(
            "Sending request to {} with messages: {:?}",
            self.service_name(),
            messages
        );

        let content = self
            .model
            .complete(messages, temperature, &GenerationResult::response_format())
            .await?;
        info!("Received response from {}: {}", self.service_name(), content);

        parse_structured(&content)
    }

    /// Asks the model to map product category terms in `question` to dataset names.
    pub async fn expand_categories(
        &self,
        question: &str,
        categories: &CategoryTranslationMap,
        temperature: f32,
    ) -> Result<CategoryExpansion, LlmError> {
        let messages = vec![
            PromptMessage::system(render_category_prompt(categories)?),
            PromptMessage::user(question),
        ];
        debug!(
            "Expanding categories for question with {} known translations",
            categories.len()
        );

        let content = self
            .model
            .complete(&messages, temperature, &CategoryExpansion::response_format())
            .await?;
        info!("Category expansion response: {}", content);

        parse_structured::<CategoryExpansion>(&content)?.validate()
    }
}

fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T, LlmError> {
    serde_json::from_str(strip_code_fence(content)).map_err(|e| {
        error!("Failed to parse structured response: {} - Response was: {}", e, content);
        LlmError::ResponseError(format!(
            "Failed to parse structured response: {} - Response was: {}",
            e, content
        ))
    })
}
