//! Analytics loaders against PostgreSQL.

use super::common::{seed_customer, seed_product, test_client, unique};
use chrono::{Duration, Utc};
use crm_insight::analytics::{
    fetch_sale_facts, load_customer_stats, load_dashboard, load_sales_analytics,
};
use crm_insight::db::DatabaseClient;
use crm_insight::records::{create_sale, delete_customer, delete_product, NewSale};

#[tokio::test]
async fn test_loaders_see_new_sales() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let pool = client.pool();
    let category = unique("Analytics");

    let customer = seed_customer(&client, "Ada Lovelace").await;
    let product = seed_product(&client, &category, 40.0).await;
    let sale = create_sale(
        pool,
        NewSale {
            customer_id: customer.id,
            product_id: product.id,
            quantity: 2,
            total_amount: None,
            status: None,
        },
    )
    .await
    .unwrap();

    let since = sale.created_at - Duration::seconds(1);
    let facts = fetch_sale_facts(pool, Some(since)).await.unwrap();
    let ours = facts
        .iter()
        .find(|f| f.category.as_deref() == Some(category.as_str()))
        .unwrap();
    assert_eq!(ours.total_amount, 80.0);

    let now = Utc::now();
    let analytics = load_sales_analytics(pool, now).await.unwrap();
    let performance = analytics
        .category_data
        .iter()
        .find(|c| c.name == category)
        .unwrap();
    assert_eq!(performance.current, 80.0);
    assert_eq!(performance.previous, 0.0);
    assert!(!analytics.monthly_data.is_empty());

    let dashboard = load_dashboard(pool, now).await.unwrap();
    assert!(dashboard.stats.total_revenue >= 80.0);
    assert!(dashboard.stats.total_customers >= 1);
    assert!(dashboard.recent_sales.len() <= 5);
    assert_eq!(dashboard.category_sales.months.len(), 3);
    assert!(dashboard
        .category_distribution
        .contains_key(&category.to_lowercase()));

    let stats = load_customer_stats(pool, now).await.unwrap();
    assert!(stats.total_customers >= 1);
    assert!(stats.average_order_value > 0.0);
    assert!(stats.customer_retention > 0.0);

    delete_customer(pool, customer.id).await.unwrap();
    delete_product(pool, product.id).await.unwrap();
    client.close().await.unwrap();
}
