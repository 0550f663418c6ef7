//! Dashboard, analytics and insights handlers.

use serde::Serialize;

use super::sales::{recent_rows, RECENT_HEADERS};
use crate::analytics::{load_dashboard, load_sales_analytics, Dashboard, SalesAnalytics};
use crate::commands::{format_money, format_percent, CommandContext, CommandOutput};
use crate::error::Result;
use crate::insights::{InsightGenerator, InsightSource, SalesInsights};

pub async fn dashboard(ctx: &CommandContext<'_>) -> Result<CommandOutput> {
    let dashboard = load_dashboard(ctx.pool, ctx.now).await?;
    render_dashboard(&dashboard)
}

pub(crate) fn render_dashboard(d: &Dashboard) -> Result<CommandOutput> {
    let stats = &d.stats;
    let mut output = CommandOutput::new(d)?.heading("Overview").fields([
        ("Revenue (30 days)", format_money(stats.total_revenue)),
        ("Previous 30 days", format_money(stats.previous_revenue)),
        ("Growth", format_percent(stats.revenue_change)),
        ("Customers", stats.total_customers.to_string()),
        ("Active customers", stats.active_customers.to_string()),
    ]);

    let months = &d.category_sales.months;
    let mut headers = vec!["Category"];
    headers.extend(months.iter().map(|m| m.date.as_str()));
    headers.push("Total");
    let rows = d
        .category_sales
        .totals
        .iter()
        .map(|(category, total)| {
            let mut row = vec![category.clone()];
            row.extend(months.iter().map(|m| {
                format_money(m.categories.get(category).copied().unwrap_or_default())
            }));
            row.push(format_money(*total));
            row
        })
        .collect();
    output = output.heading("Sales by category").table(&headers, rows);

    let distribution = d
        .category_distribution
        .iter()
        .map(|(category, share)| vec![category.clone(), format!("{share:.1}%")])
        .collect();
    output = output
        .heading("Revenue share")
        .table(&["Category", "Share"], distribution);

    Ok(output
        .heading("Recent sales")
        .table(RECENT_HEADERS, recent_rows(&d.recent_sales)))
}

pub async fn analytics(ctx: &CommandContext<'_>) -> Result<CommandOutput> {
    let analytics = load_sales_analytics(ctx.pool, ctx.now).await?;
    render_analytics(&analytics)
}

pub(crate) fn render_analytics(a: &SalesAnalytics) -> Result<CommandOutput> {
    let monthly = a
        .monthly_data
        .iter()
        .map(|m| vec![m.name.clone(), format_money(m.sales), format_money(m.prediction)])
        .collect();
    let categories = a
        .category_data
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                format_money(c.current),
                format_money(c.previous),
            ]
        })
        .collect();

    Ok(CommandOutput::new(a)?
        .heading("Monthly sales")
        .table(&["Month", "Sales", "Prediction"], monthly)
        .heading("Category performance")
        .table(&["Category", "Last 3 months", "Before"], categories))
}

/// Insights together with the analytics they were generated from.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsightsBody<'a> {
    #[serde(flatten)]
    insights: &'a SalesInsights,
    analytics: &'a SalesAnalytics,
}

pub async fn insights(ctx: &CommandContext<'_>) -> Result<CommandOutput> {
    let analytics = load_sales_analytics(ctx.pool, ctx.now).await?;
    let generator = InsightGenerator::new(ctx.require_llm()?, ctx.config.llm.insights_model.clone());
    let insights = generator.generate(&analytics).await;
    render_insights(&insights, &analytics)
}

pub(crate) fn render_insights(
    insights: &SalesInsights,
    analytics: &SalesAnalytics,
) -> Result<CommandOutput> {
    let mut output = CommandOutput::new(&InsightsBody {
        insights,
        analytics,
    })?;
    if insights.source == InsightSource::Fallback {
        output = output.info("Failed to generate AI insights, showing computed insights instead.");
    }

    output = output
        .heading("Trend analysis")
        .info(insights.trend_analysis.clone())
        .heading("Category insights")
        .info(insights.category_insights.clone())
        .heading("Recommendations")
        .info(insights.recommendations.join("\n"));
    if !insights.risks.is_empty() {
        output = output
            .heading("Risks")
            .info(insights.risks.join("\n"));
    }
    Ok(output)
}
