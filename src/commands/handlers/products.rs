//! Product command handlers.

use serde_json::json;

use super::or_dash;
use crate::cli::ProductCommand;
use crate::commands::{format_money, CommandContext, CommandOutput};
use crate::error::Result;
use crate::records::{
    create_product, delete_product, get_product, list_categories, list_products, update_product,
    NewProduct, Product, ProductChanges, ProductFilter,
};

pub async fn handle(ctx: &CommandContext<'_>, command: ProductCommand) -> Result<CommandOutput> {
    match command {
        ProductCommand::List {
            search,
            category,
            page,
        } => {
            let filter = ProductFilter {
                search,
                category,
                page,
            };
            let page = list_products(ctx.pool, &filter).await?;
            let rows = page.products.iter().map(product_row).collect();
            Ok(CommandOutput::new(&page)?
                .table(&["ID", "Name", "Category", "Price", "Stock"], rows)
                .info(format!(
                    "Page {} of {} ({} products)",
                    page.page,
                    page.total_pages.max(1),
                    page.total
                )))
        }
        ProductCommand::Show { id } => {
            let product = get_product(ctx.pool, id).await?;
            Ok(CommandOutput::new(&product)?.fields(product_fields(&product)))
        }
        ProductCommand::Add {
            name,
            category,
            price,
            description,
            photo_url,
        } => {
            let product = create_product(
                ctx.pool,
                NewProduct {
                    name,
                    category,
                    price,
                    description,
                    photo_url,
                },
            )
            .await?;
            Ok(CommandOutput::new(&product)?
                .info("Product created")
                .fields(product_fields(&product)))
        }
        ProductCommand::Update {
            id,
            name,
            category,
            price,
            description,
            photo_url,
            stock,
        } => {
            let product = update_product(
                ctx.pool,
                id,
                ProductChanges {
                    name,
                    category,
                    price,
                    description,
                    photo_url,
                    stock_quantity: stock,
                },
            )
            .await?;
            Ok(CommandOutput::new(&product)?
                .info("Product updated")
                .fields(product_fields(&product)))
        }
        ProductCommand::Delete { id } => {
            delete_product(ctx.pool, id).await?;
            Ok(CommandOutput::new(&json!({ "success": true }))?.info(format!("Product {id} deleted")))
        }
        ProductCommand::Categories => {
            let categories = list_categories(ctx.pool).await?;
            let rows = categories.iter().map(|c| vec![c.clone()]).collect();
            Ok(CommandOutput::new(&categories)?.table(&["Category"], rows))
        }
    }
}

fn product_row(p: &Product) -> Vec<String> {
    vec![
        p.id.to_string(),
        p.name.clone(),
        or_dash(p.category.as_deref()),
        format_money(p.price),
        p.stock_quantity.to_string(),
    ]
}

fn product_fields(p: &Product) -> Vec<(&'static str, String)> {
    vec![
        ("ID", p.id.to_string()),
        ("Name", p.name.clone()),
        ("Category", or_dash(p.category.as_deref())),
        ("Price", format_money(p.price)),
        ("Stock", p.stock_quantity.to_string()),
        ("Description", or_dash(p.description.as_deref())),
        ("Photo", or_dash(p.photo_url.as_deref())),
    ]
}
