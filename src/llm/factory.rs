//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use crate::config::LlmConfig;
use crate::error::{CrmError, Result};
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OpenAiClient, OpenAiConfig};
use tracing::debug;

/// Creates an LLM client from configuration.
///
/// The API key comes from `config.api_key`, which already includes the
/// `OPENAI_API_KEY` override. The client's default model is the SQL model;
/// callers pass the insights model per request.
pub fn create_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    let provider: LlmProvider = config.provider.parse()?;

    match provider {
        LlmProvider::OpenAi => {
            let key = config
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| {
                    CrmError::config(
                        "No OpenAI API key configured. Set OPENAI_API_KEY or [llm] api_key.",
                    )
                })?;

            let mut openai = OpenAiConfig::new(key, config.sql_model.clone())
                .with_timeout(config.timeout_secs);
            if let Some(base_url) = &config.base_url {
                openai = openai.with_base_url(base_url.clone());
            }
            let client = OpenAiClient::new(openai)?;
            debug!(model = client.model(), "Using OpenAI provider");
            Ok(Box::new(client))
        }
        LlmProvider::Mock => {
            debug!("Using mock LLM provider");
            Ok(Box::new(MockLlmClient::new()))
        }
    }
}
