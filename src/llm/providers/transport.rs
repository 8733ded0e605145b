use crate::config::LlmConfig;
use crate::llm::LlmError;
use crate::prompts::PromptMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};

#[derive(Serialize, Debug)]
pub(super) struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: &'a [PromptMessage],
    pub temperature: f32,
    pub response_format: &'a Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

pub(super) enum Credential<'a> {
    Bearer(&'a str),
    ApiKey(&'a str),
}

enum Failure {
    Transient(LlmError),
    Fatal(LlmError),
}

/// Upper bound on the wait between two attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// HTTP client for chat-completion endpoints with a request timeout and
/// exponential backoff on transport errors and 5xx responses.
pub(super) struct ChatTransport {
    client: reqwest::Client,
    max_retries: u32,
    backoff: Duration,
}

impl ChatTransport {
    pub(super) fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    // backoff * 2^attempt, capped
    fn retry_delay(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.backoff.checked_mul(factor))
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }

    pub(super) async fn send(
        &self,
        url: &str,
        credential: &Credential<'_>,
        request: &ChatRequest<'_>,
    ) -> Result<String, LlmError> {
        let mut attempt = 0;

        loop {
            match self.send_once(url, credential, request).await {
                Ok(content) => return Ok(content),
                Err(Failure::Transient(e)) if attempt < self.max_retries => {
                    let delay = self.retry_delay(attempt);
                    attempt += 1;
                    warn!(
                        "Transient failure calling {} ({}); retry {}/{} in {:?}",
                        url, e, attempt, self.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(Failure::Transient(e)) | Err(Failure::Fatal(e)) => {
                    error!("Chat completion request failed: {}", e);
                    return Err(e);
                }
            }
        }
    }

    async fn send_once(
        &self,
        url: &str,
        credential: &Credential<'_>,
        request: &ChatRequest<'_>,
    ) -> Result<String, Failure> {
        debug!("POST {}", url);

        let builder = match credential {
            Credential::Bearer(key) => self
                .client
                .post(url)
                .header("Authorization", format!("Bearer {}", key)),
            Credential::ApiKey(key) => self.client.post(url).header("api-key", *key),
        };

        let response = builder
            .json(request)
            .send()
            .await
            .map_err(|e| Failure::Transient(LlmError::ConnectionError(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            // Try to get the error message from the response body
            let error_body = match response.text().await {
                Ok(body) if !body.is_empty() => format!(" - Response body: {}", body),
                _ => String::new(),
            };
            let err = LlmError::ResponseError(format!(
                "API responded with status code: {}{}",
                status, error_body
            ));

            return Err(if status.is_server_error() {
                Failure::Transient(err)
            } else {
                Failure::Fatal(err)
            });
        }

        let response_text = response.text().await.map_err(|e| {
            Failure::Transient(LlmError::ConnectionError(format!(
                "Failed to read response body: {}",
                e
            )))
        })?;
        debug!("Raw chat completion response: {}", response_text);

        let chat_response: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            Failure::Fatal(LlmError::ResponseError(format!(
                "Failed to parse chat completion: {} - Response was: {}",
                e, response_text
            )))
        })?;

        let Some(choice) = chat_response.choices.into_iter().next() else {
            return Err(Failure::Fatal(LlmError::ResponseError(
                "No choices in response".to_string(),
            )));
        };

        if let Some(refusal) = choice.message.refusal {
            return Err(Failure::Fatal(LlmError::ResponseError(format!(
                "Model refused the request: {}",
                refusal
            ))));
        }

        choice
            .message
            .content
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                Failure::Fatal(LlmError::ResponseError(
                    "Empty message content in response".to_string(),
                ))
            })
    }
}
