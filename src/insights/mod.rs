//! LLM sales insights with a computed fallback.

use serde::Serialize;
use tracing::{info, warn};

use crate::analytics::{percent_change, CategoryPerformance, SalesAnalytics};
use crate::error::Result;
use crate::llm::{build_insights_messages, CompletionOptions, LlmClient};

/// Sampling temperature for insight generation.
pub const INSIGHTS_TEMPERATURE: f64 = 0.7;

/// Categories named in the fallback growth summary.
const TOP_GROWTH_CATEGORIES: usize = 2;

/// Where a set of insights came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightSource {
    Llm,
    Fallback,
}

/// Structured insights as returned by the insights command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesInsights {
    pub trend_analysis: String,
    pub category_insights: String,
    pub recommendations: Vec<String>,
    pub risks: Vec<String>,
    #[serde(skip)]
    pub source: InsightSource,
}

/// The user message sent to the analyst model.
pub fn build_analysis_request(analytics: &SalesAnalytics) -> String {
    let monthly = analytics
        .monthly_data
        .iter()
        .map(|m| format!("{}: Sales {}, Prediction {}", m.name, m.sales, m.prediction))
        .collect::<Vec<_>>()
        .join("\n");
    let categories = analytics
        .category_data
        .iter()
        .map(|c| format!("{}: Current {}, Previous {}", c.name, c.current, c.previous))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze the following sales data and provide insights:\n\
         Monthly Sales Data:\n{monthly}\n\n\
         Category Performance:\n{categories}\n\n\
         Please provide:\n\
         1. A trend analysis of the monthly sales\n\
         2. Insights about category performance\n\
         3. Key recommendations (as a list)\n\
         4. Potential risks (as a list)"
    )
}

fn non_empty_lines(section: &str) -> Vec<String> {
    section
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits a completion into its four blank-line separated sections.
/// Missing sections are left empty.
pub fn parse_insights(response: &str) -> SalesInsights {
    let mut sections = response.split("\n\n");
    let mut next = || sections.next().unwrap_or_default();

    SalesInsights {
        trend_analysis: next().to_string(),
        category_insights: next().to_string(),
        recommendations: non_empty_lines(next()),
        risks: non_empty_lines(next()),
        source: InsightSource::Llm,
    }
}

/// Categories with positive growth, fastest first, at most two.
/// A category with no previous revenue but current revenue counts as growing.
fn top_growth_categories(categories: &[CategoryPerformance]) -> Vec<String> {
    let mut growing: Vec<(f64, &str)> = categories
        .iter()
        .map(|c| ((c.current - c.previous) / c.previous * 100.0, c.name.as_str()))
        .filter(|(growth, _)| *growth > 0.0)
        .collect();
    growing.sort_by(|a, b| b.0.total_cmp(&a.0));
    growing
        .into_iter()
        .take(TOP_GROWTH_CATEGORIES)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Insights computed from the numbers alone.
pub fn fallback_insights(analytics: &SalesAnalytics) -> SalesInsights {
    let current: f64 = analytics.category_data.iter().map(|c| c.current).sum();
    let previous: f64 = analytics.category_data.iter().map(|c| c.previous).sum();

    let trend_analysis = match percent_change(current, previous) {
        Some(growth) => format!(
            "{:.1}% {} in sales compared to the previous period.",
            growth.abs(),
            if growth >= 0.0 { "increase" } else { "decrease" }
        ),
        None => "No sales in the previous period to compare against.".to_string(),
    };

    let top = top_growth_categories(&analytics.category_data);
    let category_insights = if top.is_empty() {
        "No category grew compared to the previous period.".to_string()
    } else {
        format!("Key growth categories are {}.", top.join(" and "))
    };

    let mut recommendations: Vec<String> = top
        .iter()
        .map(|category| format!("Increase inventory for {category} category by 20%"))
        .collect();
    recommendations.push("Optimize pricing strategy for underperforming categories".to_string());
    recommendations.push("Consider seasonal promotions for growth categories".to_string());

    SalesInsights {
        trend_analysis,
        category_insights,
        recommendations,
        risks: Vec::new(),
        source: InsightSource::Fallback,
    }
}

/// Asks an LLM to interpret [`SalesAnalytics`].
pub struct InsightGenerator<'a> {
    llm: &'a dyn LlmClient,
    model: String,
}

impl<'a> InsightGenerator<'a> {
    pub fn new(llm: &'a dyn LlmClient, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// LLM insights only; errors are returned as is.
    pub async fn request(&self, analytics: &SalesAnalytics) -> Result<SalesInsights> {
        let options = CompletionOptions::new()
            .model(self.model.clone())
            .temperature(INSIGHTS_TEMPERATURE);
        let messages = build_insights_messages(&build_analysis_request(analytics));

        let response = self.llm.complete(&messages, &options).await?;
        info!(chars = response.len(), "Received sales insights");
        Ok(parse_insights(&response))
    }

    /// LLM insights, or computed ones when the LLM call fails.
    pub async fn generate(&self, analytics: &SalesAnalytics) -> SalesInsights {
        match self.request(analytics).await {
            Ok(insights) => insights,
            Err(e) => {
                warn!("Error in AI insights generation: {e}");
                fallback_insights(analytics)
            }
        }
    }
}
