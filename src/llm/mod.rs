//! LLM integration for crm-insight.
//!
//! A chat-completion client trait with an OpenAI implementation and a
//! deterministic mock, plus the prompts and response cleaning used by the
//! SQL assistant and the sales insights.

pub mod factory;
pub mod mock;
pub mod openai;
pub mod parser;
pub mod prompt;
pub mod types;

pub use factory::create_client;
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use parser::clean_sql_response;
pub use prompt::{build_insights_messages, build_sql_messages, build_sql_system_prompt};
pub use types::{CompletionOptions, Message, Role};

use async_trait::async_trait;
use std::str::FromStr;

use crate::error::{CrmError, Result};

/// Trait for LLM clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages and returns its text.
    async fn complete(&self, messages: &[Message], options: &CompletionOptions) -> Result<String>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// OpenAI chat completions (or a compatible endpoint).
    #[default]
    OpenAi,
    /// Canned responses, no network.
    Mock,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(CrmError::config(format!("Unknown LLM provider: {s}"))),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
