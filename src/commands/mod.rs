//! Command handlers and their output.
//!
//! Each handler takes a [`CommandContext`] and a parsed subcommand and returns
//! a [`CommandOutput`] carrying both the JSON body and the text rendering.

pub mod handlers;
pub mod output;

pub use output::{format_money, format_percent, Block, CommandOutput};

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;

use crate::auth::TokenStore;
use crate::config::Config;
use crate::db::DatabaseClient;
use crate::llm::LlmClient;

/// Shared resources for one command invocation.
pub struct CommandContext<'a> {
    pub pool: &'a PgPool,
    /// Read-only access for ad-hoc SQL.
    pub db: &'a dyn DatabaseClient,
    pub config: &'a Config,
    pub tokens: &'a TokenStore,
    /// Only present for commands that talk to a model.
    pub llm: Option<&'a dyn LlmClient>,
    /// Reference time for every time window in the command.
    pub now: DateTime<Utc>,
}

impl<'a> CommandContext<'a> {
    pub fn require_llm(&self) -> crate::error::Result<&'a dyn LlmClient> {
        self.llm
            .ok_or_else(|| crate::error::CrmError::internal("No LLM client configured for this command"))
    }
}
