//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on input patterns.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::{CrmError, Result};
use crate::llm::types::{CompletionOptions, Message, Role};
use crate::llm::LlmClient;

const MOCK_INSIGHTS: &str = "Sales have grown steadily over the last three months, \
with the strongest month at the end of the period.\n\n\
Electronics leads category revenue while Fashion is flat compared to the previous period.\n\n\
- Increase inventory for Electronics ahead of demand\n\
- Run a targeted promotion for Fashion\n\n\
- Dependence on a single category\n\
- Seasonal slowdown after the holiday period";

/// Mock LLM client that returns canned responses based on input patterns.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response), checked first.
    custom_responses: Vec<(String, String)>,
    /// When set, every request fails with this message.
    failure: Option<String>,
    /// Options of every request received.
    requests: Mutex<Vec<CompletionOptions>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client whose requests always fail.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns `response` whenever the user message contains `pattern`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Options passed with each request so far.
    pub fn requests(&self) -> Vec<CompletionOptions> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn mock_response(&self, system: &str, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if system.contains("business analyst") {
            return MOCK_INSIGHTS.to_string();
        }

        if input_lower.contains("top") && input_lower.contains("product") {
            return "```sql\nSELECT p.name, SUM(s.total_amount) AS revenue\nFROM sales s\n\
                    JOIN products p ON p.id = s.product_id\nGROUP BY p.name\n\
                    ORDER BY revenue DESC\nLIMIT 5;\n```"
                .to_string();
        }

        if input_lower.contains("category") {
            return "SELECT p.category, SUM(s.total_amount) AS revenue FROM sales s \
                    JOIN products p ON p.id = s.product_id GROUP BY p.category \
                    ORDER BY revenue DESC"
                .to_string();
        }

        if input_lower.contains("customer") {
            return "SELECT c.name, c.email FROM customers c WHERE c.status = 'active' \
                    ORDER BY c.created_at DESC"
                .to_string();
        }

        if input_lower.contains("delete") || input_lower.contains("remove") {
            return "DELETE FROM sales s WHERE s.created_at < now() - interval '1 year'"
                .to_string();
        }

        "SELECT COUNT(*) AS total_sales, SUM(s.total_amount) AS revenue FROM sales s".to_string()
    }

    fn last_content(messages: &[Message], role: Role) -> &str {
        messages
            .iter()
            .rev()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message], options: &CompletionOptions) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(options.clone());
        }

        if let Some(message) = &self.failure {
            return Err(CrmError::llm(message.clone()));
        }

        let system = Self::last_content(messages, Role::System);
        let input = Self::last_content(messages, Role::User);
        Ok(self.mock_response(system, input))
    }
}
