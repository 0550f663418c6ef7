//! Shared helpers for database tests.

use crm_insight::config::ConnectionConfig;
use crm_insight::db::{run_migrations, PostgresClient};
use crm_insight::records::{
    create_customer, create_product, Customer, CustomerStatus, NewCustomer, NewProduct, Product,
};
use uuid::Uuid;

/// Connects to DATABASE_URL and brings the schema up to date.
pub async fn test_client() -> Option<PostgresClient> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    let client = PostgresClient::connect(&config).await.ok()?;
    run_migrations(client.pool()).await.ok()?;
    Some(client)
}

/// A suffix that keeps rows from concurrent tests apart.
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub async fn seed_customer(client: &PostgresClient, name: &str) -> Customer {
    create_customer(
        client.pool(),
        NewCustomer {
            name: name.to_string(),
            email: format!("{}@example.com", unique("customer")),
            phone: None,
            company: Some("Test Co".to_string()),
            status: CustomerStatus::Active,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_product(client: &PostgresClient, category: &str, price: f64) -> Product {
    create_product(
        client.pool(),
        NewProduct {
            name: unique("Product"),
            category: category.to_string(),
            price,
            description: "A product created by the integration tests".to_string(),
            photo_url: None,
        },
    )
    .await
    .unwrap()
}
