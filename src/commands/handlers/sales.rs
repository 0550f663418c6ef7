//! Sales command handlers.

use super::{or_dash, short_date};
use crate::cli::SalesCommand;
use crate::commands::{format_money, CommandContext, CommandOutput};
use crate::error::Result;
use crate::records::{create_sale, recent_sales, NewSale, RecentSale};

pub async fn handle(ctx: &CommandContext<'_>, command: SalesCommand) -> Result<CommandOutput> {
    match command {
        SalesCommand::Add {
            customer,
            product,
            quantity,
            total,
            status,
        } => {
            let sale = create_sale(
                ctx.pool,
                NewSale {
                    customer_id: customer,
                    product_id: product,
                    quantity,
                    total_amount: total,
                    status,
                },
            )
            .await?;
            Ok(CommandOutput::new(&sale)?.info("Sale recorded").fields([
                ("ID", sale.id.to_string()),
                ("Quantity", sale.quantity.to_string()),
                ("Total", format_money(sale.total_amount)),
                ("Status", sale.status.clone()),
            ]))
        }
        SalesCommand::Recent { limit } => {
            let sales = recent_sales(ctx.pool, limit.max(1)).await?;
            Ok(CommandOutput::new(&sales)?.table(RECENT_HEADERS, recent_rows(&sales)))
        }
    }
}

pub(crate) const RECENT_HEADERS: &[&str] = &["", "Customer", "Email", "Product", "Amount", "Date"];

pub(crate) fn recent_rows(sales: &[RecentSale]) -> Vec<Vec<String>> {
    sales
        .iter()
        .map(|s| {
            vec![
                s.initials.clone(),
                s.customer_name.clone(),
                s.customer_email.clone(),
                format!("{} ({})", s.product_name, or_dash(s.product_category.as_deref())),
                format!("+{}", format_money(s.total_amount)),
                short_date(s.created_at),
            ]
        })
        .collect()
}
