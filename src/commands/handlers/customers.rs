//! Customer command handlers.

use serde_json::json;

use super::{or_dash, short_date};
use crate::analytics::{load_customer_stats, CustomerStats};
use crate::cli::CustomerCommand;
use crate::commands::{format_money, CommandContext, CommandOutput};
use crate::error::Result;
use crate::records::{
    create_customer, delete_customer, get_customer, list_customer_summaries, update_customer,
    Customer, CustomerChanges, CustomerSummary, NewCustomer,
};

pub async fn handle(ctx: &CommandContext<'_>, command: CustomerCommand) -> Result<CommandOutput> {
    match command {
        CustomerCommand::List(args) => {
            let summaries = args.to_filter().apply(list_customer_summaries(ctx.pool).await?);
            Ok(CommandOutput::new(&summaries)?.table(
                &["ID", "Name", "Email", "Company", "Status", "Orders", "Spent", "Last order"],
                summary_rows(&summaries),
            ))
        }
        CustomerCommand::Show { id } => {
            let customer = get_customer(ctx.pool, id).await?;
            Ok(CommandOutput::new(&customer)?.fields(customer_fields(&customer)))
        }
        CustomerCommand::Add {
            name,
            email,
            phone,
            company,
            status,
        } => {
            let customer = create_customer(
                ctx.pool,
                NewCustomer {
                    name,
                    email,
                    phone,
                    company,
                    status,
                },
            )
            .await?;
            Ok(CommandOutput::new(&customer)?
                .info("Customer created")
                .fields(customer_fields(&customer)))
        }
        CustomerCommand::Update {
            id,
            name,
            email,
            phone,
            company,
            status,
        } => {
            let customer = update_customer(
                ctx.pool,
                id,
                CustomerChanges {
                    name,
                    email,
                    phone,
                    company,
                    status,
                },
            )
            .await?;
            Ok(CommandOutput::new(&customer)?
                .info("Customer updated")
                .fields(customer_fields(&customer)))
        }
        CustomerCommand::Delete { id } => {
            delete_customer(ctx.pool, id).await?;
            Ok(CommandOutput::new(&json!({ "success": true }))?.info(format!("Customer {id} deleted")))
        }
        CustomerCommand::Stats => {
            let stats = load_customer_stats(ctx.pool, ctx.now).await?;
            Ok(CommandOutput::new(&stats)?
                .heading("Customers")
                .fields(stats_fields(&stats)))
        }
    }
}

fn summary_rows(summaries: &[CustomerSummary]) -> Vec<Vec<String>> {
    summaries
        .iter()
        .map(|s| {
            let c = &s.customer;
            vec![
                c.id.to_string(),
                c.name.clone(),
                c.email.clone(),
                or_dash(c.company.as_deref()),
                c.status.clone(),
                s.order_count.to_string(),
                format_money(s.total_spent),
                or_dash(s.last_order.as_deref()),
            ]
        })
        .collect()
}

fn customer_fields(c: &Customer) -> Vec<(&'static str, String)> {
    vec![
        ("ID", c.id.to_string()),
        ("Name", c.name.clone()),
        ("Email", c.email.clone()),
        ("Phone", or_dash(c.phone.as_deref())),
        ("Company", or_dash(c.company.as_deref())),
        ("Status", c.status.clone()),
        ("Created", short_date(c.created_at)),
        ("Updated", short_date(c.updated_at)),
    ]
}

fn stats_fields(stats: &CustomerStats) -> Vec<(&'static str, String)> {
    vec![
        ("Total customers", stats.total_customers.to_string()),
        ("Active customers", stats.active_customers.to_string()),
        ("Average order value", format_money(stats.average_order_value)),
        ("Retention", format!("{:.1}%", stats.customer_retention)),
    ]
}
