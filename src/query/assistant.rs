//! Natural-language questions to SQL.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{CrmError, Result};
use crate::llm::{build_sql_messages, clean_sql_response, CompletionOptions, LlmClient};

use super::executor::{ExecuteResponse, QueryExecutor};

/// Sampling temperature for SQL generation.
pub const SQL_TEMPERATURE: f64 = 0.1;

/// Token cap for a generated query.
pub const SQL_MAX_TOKENS: u32 = 500;

/// Generated SQL body: `{ query }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateResponse {
    pub query: String,
}

/// Result of `ask`: the generated query and, unless it was a dry run, its results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskResponse {
    pub query: String,
    #[serde(flatten)]
    pub execution: Option<ExecuteResponse>,
}

/// Turns questions about CRM data into SQL with an LLM.
pub struct SqlAssistant<'a> {
    llm: &'a dyn LlmClient,
    model: String,
}

impl<'a> SqlAssistant<'a> {
    pub fn new(llm: &'a dyn LlmClient, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// Generates a SQL query for `question`.
    pub async fn generate(&self, question: &str) -> Result<GenerateResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(CrmError::validation(
                "Question is required and must be a string",
            ));
        }

        let options = CompletionOptions::new()
            .model(self.model.clone())
            .temperature(SQL_TEMPERATURE)
            .max_tokens(SQL_MAX_TOKENS);

        let raw = self
            .llm
            .complete(&build_sql_messages(question), &options)
            .await
            .map_err(|e| {
                warn!("Error in NL to SQL conversion: {e}");
                e
            })?;

        let query = clean_sql_response(&raw);
        if query.is_empty() {
            return Err(CrmError::llm("Failed to generate SQL query"));
        }

        info!("Generated SQL for question: {}", query);
        Ok(GenerateResponse { query })
    }

    /// Generates SQL for `question` and, unless `dry_run`, executes it.
    pub async fn ask(
        &self,
        question: &str,
        executor: &QueryExecutor<'_>,
        dry_run: bool,
    ) -> Result<AskResponse> {
        let GenerateResponse { query } = self.generate(question).await?;

        if dry_run {
            return Ok(AskResponse {
                query,
                execution: None,
            });
        }

        let execution = executor.execute(&query).await?;
        Ok(AskResponse {
            query,
            execution: Some(execution),
        })
    }
}
