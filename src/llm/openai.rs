//! OpenAI LLM client implementation.
//!
//! Implements the LlmClient trait for OpenAI-compatible chat completion APIs.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{CrmError, Result};
use crate::llm::types::{CompletionOptions, Message};
use crate::llm::LlmClient;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Maximum number of retry attempts for transient errors.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 1000;

/// OpenAI client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// Model used when a request does not name one.
    pub model: String,
    /// API root, without the `/chat/completions` suffix.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// OpenAI LLM client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CrmError::llm(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request(&self, messages: &[Message], options: &CompletionOptions) -> OpenAiRequest {
        OpenAiRequest {
            model: options
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages: messages
                .iter()
                .map(|m| OpenAiMessage {
                    role: m.role.as_str().to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }

    /// Parses an API error response and returns (error, is_retryable).
    fn parse_error(status: reqwest::StatusCode, body: &str) -> (CrmError, bool) {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return (
                CrmError::llm("Authentication failed. Check your OPENAI_API_KEY."),
                false,
            );
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return (
                CrmError::llm("Rate limited. Please wait and try again."),
                true,
            );
        }

        let is_retryable = status.is_server_error();

        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            return (
                CrmError::llm(format!(
                    "OpenAI API error: {}",
                    error_response.error.message
                )),
                is_retryable,
            );
        }

        (
            CrmError::llm(format!("OpenAI API error ({status}): {body}")),
            is_retryable,
        )
    }

    fn parse_completion(body: &str) -> Result<String> {
        let response: OpenAiResponse = serde_json::from_str(body)
            .map_err(|e| CrmError::llm(format!("Failed to parse response: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| CrmError::llm("No response from OpenAI"))
    }

    fn map_request_error(error: &reqwest::Error) -> CrmError {
        if error.is_timeout() {
            CrmError::llm("Request timed out. Try again.")
        } else if error.is_connect() {
            CrmError::llm("Failed to connect to OpenAI API. Check your network.")
        } else {
            CrmError::llm(format!("Request failed: {error}"))
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[Message], options: &CompletionOptions) -> Result<String> {
        let request = self.build_request(messages, options);
        let url = self.config.completions_url();

        let mut last_error = None;
        let mut delay = self.config.retry_delay;

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!(
                "OpenAI request attempt {} of {} (model {})",
                attempt, MAX_RETRY_ATTEMPTS, request.model
            );

            let result = self
                .client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(&request)
                .send()
                .await;

            let is_retryable = match result {
                Ok(response) => {
                    let status = response.status();
                    match response.text().await {
                        Ok(body) if status.is_success() => return Self::parse_completion(&body),
                        Ok(body) => {
                            let (error, is_retryable) = Self::parse_error(status, &body);
                            warn!("OpenAI request failed (attempt {attempt}): {status}");
                            last_error = Some(error);
                            is_retryable
                        }
                        Err(e) => {
                            warn!("Failed to read OpenAI response (attempt {attempt}): {e}");
                            last_error =
                                Some(CrmError::llm(format!("Failed to read response: {e}")));
                            true
                        }
                    }
                }
                Err(e) => {
                    warn!("OpenAI request failed (attempt {attempt}): {e}");
                    last_error = Some(Self::map_request_error(&e));
                    e.is_timeout() || e.is_connect()
                }
            };

            if !is_retryable || attempt == MAX_RETRY_ATTEMPTS {
                break;
            }

            debug!("Retrying OpenAI request in {:?}", delay);
            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        Err(last_error.unwrap_or_else(|| CrmError::llm("No request was made")))
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}
