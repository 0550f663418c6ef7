//! The question-to-results and insights pipelines with mock clients.
//!
//! Needs no database or network.

use crm_insight::analytics::{sales_analytics, SaleFact};
use crm_insight::db::{FailingDatabaseClient, MockDatabaseClient};
use crm_insight::error::CrmError;
use crm_insight::insights::{InsightGenerator, InsightSource};
use crm_insight::llm::MockLlmClient;
use crm_insight::query::{ErrorBody, QueryExecutor, SqlAssistant};
use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

const SQL_MODEL: &str = "gpt-4-0125-preview";

#[tokio::test]
async fn test_question_to_results() {
    let db = MockDatabaseClient::new();
    let llm = MockLlmClient::new();
    let executor = QueryExecutor::new(&db);

    let response = SqlAssistant::new(&llm, SQL_MODEL)
        .ask("What are the top products by revenue?", &executor, false)
        .await
        .unwrap();

    // Fences and the trailing semicolon are gone before execution.
    assert!(!response.query.contains("```"));
    assert!(!response.query.ends_with(';'));
    assert_eq!(db.executed(), vec![response.query.clone()]);

    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["results"], json!([{"result": 1}]));
    assert_eq!(body["metadata"]["rowCount"], 1);
    assert_eq!(body["metadata"]["query"], body["query"]);
}

#[tokio::test]
async fn test_generated_write_is_rejected_before_execution() {
    let db = MockDatabaseClient::new();
    let llm = MockLlmClient::new();

    let err = SqlAssistant::new(&llm, SQL_MODEL)
        .ask("delete sales older than a year", &QueryExecutor::new(&db), false)
        .await
        .unwrap_err();

    assert!(matches!(err, CrmError::Rejected(_)));
    assert!(db.executed().is_empty());
    assert_eq!(
        serde_json::to_value(ErrorBody::for_execution(&err)).unwrap(),
        json!({
            "error": "Only read-only queries are allowed",
            "hint": "For security reasons, only SELECT, WITH, and other read operations are permitted"
        })
    );
}

#[tokio::test]
async fn test_custom_generated_sql() {
    let db = MockDatabaseClient::new();
    let llm = MockLlmClient::new()
        .with_response("refund", "```sql\nSELECT COUNT(*) FROM sales WHERE status = 'refunded';\n```");

    let generated = SqlAssistant::new(&llm, SQL_MODEL)
        .generate("How many refunds?")
        .await
        .unwrap();
    assert_eq!(
        generated.query,
        "SELECT COUNT(*) FROM sales WHERE status = 'refunded'"
    );
    assert!(db.executed().is_empty());
}

#[tokio::test]
async fn test_llm_failure_surfaces_as_llm_error() {
    let db = MockDatabaseClient::new();
    let llm = MockLlmClient::failing("rate limited");

    let err = SqlAssistant::new(&llm, SQL_MODEL)
        .ask("How many customers?", &QueryExecutor::new(&db), false)
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Llm(_)));
    assert!(db.executed().is_empty());
}

#[tokio::test]
async fn test_database_failure_body() {
    let db = FailingDatabaseClient::new("relation \"orders\" does not exist");
    let err = QueryExecutor::new(&db)
        .execute("SELECT * FROM orders")
        .await
        .unwrap_err();

    let body = ErrorBody::for_execution(&err);
    assert_eq!(body.error, "Failed to execute SQL query");
    assert_eq!(
        body.details.as_deref(),
        Some("relation \"orders\" does not exist")
    );
}

#[tokio::test]
async fn test_insights_from_sales() {
    let now = Utc.with_ymd_and_hms(2025, 6, 30, 12, 0, 0).unwrap();
    let sale = |days: i64, amount: f64, category: &str| SaleFact {
        created_at: now - Duration::days(days),
        total_amount: amount,
        category: Some(category.to_string()),
    };
    let sales = vec![
        sale(5, 300.0, "Electronics"),
        sale(40, 100.0, "Fashion"),
        sale(120, 200.0, "Electronics"),
        sale(150, 150.0, "Fashion"),
    ];
    let analytics = sales_analytics(&sales, now);

    let llm = MockLlmClient::new();
    let insights = InsightGenerator::new(&llm, "gpt-4-turbo-preview")
        .generate(&analytics)
        .await;
    assert_eq!(insights.source, InsightSource::Llm);
    assert_eq!(insights.risks.len(), 2);

    let failing = MockLlmClient::failing("timeout");
    let fallback = InsightGenerator::new(&failing, "gpt-4-turbo-preview")
        .generate(&analytics)
        .await;
    assert_eq!(fallback.source, InsightSource::Fallback);
    // 400 current vs 350 previous
    assert_eq!(
        fallback.trend_analysis,
        "14.3% increase in sales compared to the previous period."
    );
    assert_eq!(
        fallback.category_insights,
        "Key growth categories are Electronics."
    );
}
