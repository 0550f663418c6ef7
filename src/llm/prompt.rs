//! Prompt construction for LLM requests.
//!
//! The SQL prompt describes the CRM schema and how generated queries must be
//! shaped; the insights prompt frames the model as a business analyst.

use crate::llm::types::Message;

/// Tables and columns the SQL assistant may query.
pub const CRM_SCHEMA: &str = r#"customers:
- id (uuid, primary key)
- name (varchar, not null)
- email (varchar, not null)
- phone (varchar)
- company (varchar)
- status (varchar, 'active' or 'inactive')
- created_at (timestamp with time zone, default: now())
- updated_at (timestamp with time zone, default: now())

products:
- id (uuid, primary key)
- name (varchar, not null)
- category (varchar)
- price (decimal, not null)
- description (text)
- stock_quantity (integer, not null)
- created_at (timestamp with time zone, default: now())
- updated_at (timestamp with time zone, default: now())

sales:
- id (uuid, primary key)
- customer_id (uuid, foreign key references customers.id)
- product_id (uuid, foreign key references products.id)
- quantity (integer, not null)
- total_amount (decimal, not null)
- status (varchar, default: 'completed')
- created_at (timestamp with time zone, default: now())"#;

/// System prompt template for natural-language to SQL conversion.
const SQL_SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a SQL expert that converts natural language questions about customer, sales and product data into SQL queries.

The database has the following schema:

{schema}

Guidelines:
1. Use appropriate date/time functions for PostgreSQL
2. Always use table aliases for better readability (e.g., c for customers, p for products, s for sales)
3. Format numbers using appropriate decimal places
4. Include proper JOIN conditions when querying across tables
5. Use appropriate aggregation functions (SUM, AVG, COUNT) as needed
6. Add ORDER BY clauses when relevant
7. Use appropriate WHERE clauses to filter data
8. Use CTEs (WITH clause) for complex queries when it improves readability
9. For date/time comparisons, use created_at field
10. When calculating revenue or sales, use total_amount from the sales table
11. Return ONLY the raw SQL query without any markdown formatting, backticks, or sql tags
12. Do not include any explanations or comments in the response
13. Do not include semicolons at the end of queries

Example output format:
SELECT * FROM products p WHERE p.name = 'Example'"#;

/// System prompt for sales insight generation.
pub const INSIGHTS_SYSTEM_PROMPT: &str =
    "You are a business analyst AI that provides concise, actionable insights from sales data.";

/// Builds the SQL system prompt with the CRM schema injected.
pub fn build_sql_system_prompt() -> String {
    SQL_SYSTEM_PROMPT_TEMPLATE.replace("{schema}", CRM_SCHEMA)
}

/// Messages for turning `question` into SQL.
pub fn build_sql_messages(question: &str) -> Vec<Message> {
    vec![
        Message::system(build_sql_system_prompt()),
        Message::user(question),
    ]
}

/// Messages for analysing the already formatted sales summary.
pub fn build_insights_messages(analysis_request: &str) -> Vec<Message> {
    vec![
        Message::system(INSIGHTS_SYSTEM_PROMPT),
        Message::user(analysis_request),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn test_sql_prompt_contains_schema_and_guidelines() {
        let prompt = build_sql_system_prompt();
        assert!(!prompt.contains("{schema}"));
        assert!(prompt.contains("customers:"));
        assert!(prompt.contains("- total_amount (decimal, not null)"));
        assert!(prompt.contains("13. Do not include semicolons"));
    }

    #[test]
    fn test_sql_messages() {
        let messages = build_sql_messages("Top 5 products by revenue");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "Top 5 products by revenue");
    }

    #[test]
    fn test_insights_messages() {
        let messages = build_insights_messages("Analyze this");
        assert!(messages[0].content.starts_with("You are a business analyst AI"));
        assert_eq!(messages[1].role, Role::User);
    }
}
