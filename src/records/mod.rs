//! CRM records: customers, products and sales.
//!
//! Each submodule pairs plain validation with async functions over the shared
//! `PgPool`. Money columns are `NUMERIC` in the database and read as `f64`.

pub mod customers;
pub mod products;
pub mod sales;
pub mod validation;

pub use customers::{
    create_customer, delete_customer, get_customer, list_customer_summaries, list_customers,
    update_customer, Customer, CustomerChanges, CustomerFilter, CustomerStatus, CustomerSummary,
    NewCustomer,
};
pub use products::{
    create_product, delete_product, get_product, list_categories, list_products, update_product,
    NewProduct, Product, ProductChanges, ProductFilter, ProductPage, ITEMS_PER_PAGE,
};
pub use sales::{create_sale, recent_sales, NewSale, RecentSale, Sale, RECENT_SALES_LIMIT};
