//! Customer, product and sale management against PostgreSQL.

use super::common::{seed_customer, seed_product, test_client, unique};
use crm_insight::error::CrmError;
use crm_insight::records::{
    create_sale, delete_customer, delete_product, get_customer, get_product, list_categories,
    list_customer_summaries, list_products, recent_sales, update_customer, update_product,
    CustomerChanges, CustomerStatus, NewSale, ProductChanges, ProductFilter,
};
use crm_insight::db::DatabaseClient;

#[tokio::test]
async fn test_customer_lifecycle() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let pool = client.pool();

    let customer = seed_customer(&client, "Grace Hopper").await;
    assert_eq!(customer.status, "active");
    assert_eq!(get_customer(pool, customer.id).await.unwrap(), customer);

    let updated = update_customer(
        pool,
        customer.id,
        CustomerChanges {
            status: Some(CustomerStatus::Inactive),
            phone: Some("+1 555 0100".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.status, "inactive");
    assert_eq!(updated.phone.as_deref(), Some("+1 555 0100"));
    assert_eq!(updated.name, "Grace Hopper");
    assert!(updated.updated_at >= customer.updated_at);

    // A blank value clears the field, an absent one keeps it.
    let cleared = update_customer(
        pool,
        customer.id,
        CustomerChanges {
            company: Some("  ".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(cleared.company, None);
    assert_eq!(cleared.phone.as_deref(), Some("+1 555 0100"));

    let summaries = list_customer_summaries(pool).await.unwrap();
    let summary = summaries
        .iter()
        .find(|s| s.customer.id == customer.id)
        .unwrap();
    assert_eq!(summary.order_count, 0);
    assert_eq!(summary.last_order, None);

    delete_customer(pool, customer.id).await.unwrap();
    assert!(matches!(
        get_customer(pool, customer.id).await,
        Err(CrmError::NotFound(_))
    ));
    assert!(matches!(
        delete_customer(pool, customer.id).await,
        Err(CrmError::NotFound(_))
    ));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_invalid_customer_update_is_rejected() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let customer = seed_customer(&client, "Alan Turing").await;
    let err = update_customer(
        client.pool(),
        customer.id,
        CustomerChanges {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));

    delete_customer(client.pool(), customer.id).await.unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_product_catalog() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let pool = client.pool();
    let category = unique("Gadgets");

    let mut created = Vec::new();
    for price in [10.0, 20.5, 30.25] {
        created.push(seed_product(&client, &category, price).await);
    }
    assert_eq!(created[0].stock_quantity, 0);

    let page = list_products(
        pool,
        &ProductFilter {
            category: Some(category.clone()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 1);
    // Newest first.
    assert_eq!(page.products[0].id, created[2].id);
    assert_eq!(page.products[0].price, 30.25);

    let by_name = list_products(
        pool,
        &ProductFilter {
            search: Some(created[1].name.to_uppercase()),
            category: Some("all".to_string()),
            page: 1,
        },
    )
    .await
    .unwrap();
    assert_eq!(by_name.total, 1);
    assert_eq!(by_name.products[0].id, created[1].id);

    assert!(list_categories(pool).await.unwrap().contains(&category));

    let updated = update_product(
        pool,
        created[0].id,
        ProductChanges {
            price: Some(12.99),
            stock_quantity: Some(7),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.price, 12.99);
    assert_eq!(updated.stock_quantity, 7);

    for product in &created {
        delete_product(pool, product.id).await.unwrap();
    }
    assert!(matches!(
        get_product(pool, created[0].id).await,
        Err(CrmError::NotFound(_))
    ));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_sales_are_priced_and_summarized() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let pool = client.pool();

    let customer = seed_customer(&client, "Katherine Johnson").await;
    let product = seed_product(&client, &unique("Orbit"), 19.99).await;

    let priced = create_sale(
        pool,
        NewSale {
            customer_id: customer.id,
            product_id: product.id,
            quantity: 3,
            total_amount: None,
            status: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(priced.total_amount, 59.97);
    assert_eq!(priced.status, "completed");

    create_sale(
        pool,
        NewSale {
            customer_id: customer.id,
            product_id: product.id,
            quantity: 1,
            total_amount: Some(5.0),
            status: Some("pending".to_string()),
        },
    )
    .await
    .unwrap();

    let summary = list_customer_summaries(pool)
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.customer.id == customer.id)
        .unwrap();
    assert_eq!(summary.order_count, 2);
    assert!((summary.total_spent - 64.97).abs() < 1e-9);
    assert!(summary.last_order.is_some());

    let recent = recent_sales(pool, 5).await.unwrap();
    assert!(recent.len() <= 5);
    if let Some(ours) = recent.iter().find(|s| s.id == priced.id) {
        assert_eq!(ours.initials, "KJ");
    }

    delete_customer(pool, customer.id).await.unwrap();
    delete_product(pool, product.id).await.unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_sale_for_missing_customer_is_not_found() {
    let Some(client) = test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let product = seed_product(&client, &unique("Orphans"), 1.0).await;

    let err = create_sale(
        client.pool(),
        NewSale {
            customer_id: uuid::Uuid::new_v4(),
            product_id: product.id,
            quantity: 1,
            total_amount: Some(1.0),
            status: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CrmError::NotFound(_)));

    delete_product(client.pool(), product.id).await.unwrap();
    client.close().await.unwrap();
}
