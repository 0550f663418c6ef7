//! `ask` and `sql` handlers.

use crate::commands::{CommandContext, CommandOutput};
use crate::error::Result;
use crate::query::{AskResponse, ExecuteResponse, QueryExecutor, SqlAssistant};

pub async fn sql(ctx: &CommandContext<'_>, query: &str) -> Result<CommandOutput> {
    let response = QueryExecutor::new(ctx.db).execute(query).await?;
    let output = CommandOutput::new(&response)?;
    Ok(with_results(output, &response))
}

pub async fn ask(ctx: &CommandContext<'_>, question: &str, dry_run: bool) -> Result<CommandOutput> {
    let assistant = SqlAssistant::new(ctx.require_llm()?, ctx.config.llm.sql_model.clone());
    let executor = QueryExecutor::new(ctx.db);
    let response = assistant.ask(question, &executor, dry_run).await?;
    render_ask(&response)
}

pub(crate) fn render_ask(response: &AskResponse) -> Result<CommandOutput> {
    let output = CommandOutput::new(response)?.info(response.query.clone());
    Ok(match &response.execution {
        Some(execution) => with_results(output, execution),
        None => output,
    })
}

fn with_results(output: CommandOutput, response: &ExecuteResponse) -> CommandOutput {
    let result = &response.result;
    let headers: Vec<&str> = result.columns.iter().map(|c| c.name.as_str()).collect();
    let summary = format!(
        "{} row{} ({} ms)",
        response.metadata.row_count,
        if response.metadata.row_count == 1 { "" } else { "s" },
        result.execution_time.as_millis()
    );

    let output = output.table(&headers, result.display_rows()).info(summary);
    match result.truncation_warning() {
        Some(warning) => output.info(warning),
        None => output,
    }
}
