//! Read-only query execution against PostgreSQL.

use super::common::{seed_customer, test_client};
use crm_insight::db::DatabaseClient;
use crm_insight::error::CrmError;
use crm_insight::query::{ErrorBody, QueryExecutor};
use crm_insight::records::{delete_customer, get_customer};
use serde_json::json;

#[tokio::test]
async fn test_select_rows_are_json_objects() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let response = QueryExecutor::new(&client)
        .execute("SELECT 1 AS num, 'hello' AS greeting, NULL::text AS nothing;")
        .await
        .unwrap();

    assert_eq!(response.metadata.row_count, 1);
    assert_eq!(
        response.metadata.query,
        "SELECT 1 AS num, 'hello' AS greeting, NULL::text AS nothing;"
    );
    assert_eq!(
        serde_json::Value::Object(response.results[0].clone()),
        json!({"num": 1, "greeting": "hello", "nothing": null})
    );
    let names: Vec<_> = response.result.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["num", "greeting", "nothing"]);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_cte_query() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let response = QueryExecutor::new(&client)
        .execute("WITH t AS (SELECT generate_series(1, 3) AS n) SELECT SUM(n) AS total FROM t")
        .await
        .unwrap();
    assert_eq!(response.results[0]["total"], json!(6));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_large_results_are_capped() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let response = QueryExecutor::new(&client)
        .execute("SELECT generate_series(1, 1500) AS n")
        .await
        .unwrap();
    assert_eq!(response.metadata.row_count, 1000);
    assert!(response.result.was_truncated);
    assert_eq!(response.result.total_rows, 1500);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_explain_runs_unwrapped() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let response = QueryExecutor::new(&client)
        .execute("EXPLAIN SELECT * FROM customers")
        .await
        .unwrap();
    assert!(response.metadata.row_count >= 1);
    assert_eq!(response.result.columns[0].name, "QUERY PLAN");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_writes_never_reach_the_database() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let customer = seed_customer(&client, "Hedy Lamarr").await;
    let executor = QueryExecutor::new(&client);

    for sql in [
        format!("DELETE FROM customers WHERE id = '{}'", customer.id),
        format!("SELECT 1; DELETE FROM customers WHERE id = '{}'", customer.id),
        format!(
            "WITH gone AS (DELETE FROM customers WHERE id = '{}' RETURNING id) SELECT * FROM gone",
            customer.id
        ),
    ] {
        let err = executor.execute(&sql).await.unwrap_err();
        assert!(matches!(err, CrmError::Rejected(_)), "not rejected: {sql}");
    }

    assert!(get_customer(client.pool(), customer.id).await.is_ok());
    delete_customer(client.pool(), customer.id).await.unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_database_errors_have_hint() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let err = QueryExecutor::new(&client)
        .execute("SELECT no_such_column FROM customers")
        .await
        .unwrap_err();
    assert!(matches!(err, CrmError::Query(_)));

    let body = ErrorBody::for_execution(&err);
    assert_eq!(body.error, "Failed to execute SQL query");
    assert!(body.details.unwrap().contains("no_such_column"));
    assert!(body.hint.is_some());

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_trailing_line_comment() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let response = QueryExecutor::new(&client)
        .execute("SELECT 1 AS num -- latest")
        .await
        .unwrap();
    assert_eq!(response.results[0]["num"], json!(1));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_column_names_are_kept() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let response = QueryExecutor::new(&client)
        .execute("SELECT a.id, b.id FROM (SELECT 1 AS id) a, (SELECT 2 AS id) b")
        .await
        .unwrap();
    assert_eq!(
        serde_json::Value::Object(response.results[0].clone()),
        json!({"id": 1, "id_2": 2})
    );

    client.close().await.unwrap();
}
