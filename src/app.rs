//! Runs one parsed command against the configured database and LLM.

use chrono::Utc;
use tracing::{debug, info};

use crate::auth::{AuthService, TokenStore};
use crate::cli::{Cli, Command};
use crate::commands::handlers;
use crate::commands::{CommandContext, CommandOutput};
use crate::config::Config;
use crate::db::{run_migrations, DatabaseClient, PostgresClient};
use crate::error::{CrmError, Result};
use crate::llm::{create_client, LlmClient};

/// Applies command-line overrides to the loaded configuration.
pub fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(url) = &cli.database_url {
        config.database.url = Some(url.clone());
    }
    if cli.mock_llm {
        config.llm.provider = "mock".to_string();
    }
}

fn needs_llm(command: &Command) -> bool {
    matches!(command, Command::Ask { .. } | Command::Insights)
}

/// Connects, enforces the session requirement and dispatches `command`.
pub async fn run(command: Command, config: &Config) -> Result<CommandOutput> {
    if !config.database.is_configured() {
        return Err(CrmError::config(
            "No database configured. Set DATABASE_URL or [database] in the config file.",
        ));
    }

    let llm = if needs_llm(&command) {
        Some(create_client(&config.llm)?)
    } else {
        None
    };

    info!("Connecting to {}", config.database.display_string());
    let client = PostgresClient::connect(&config.database).await?;
    let tokens = TokenStore::new(&Config::config_dir());

    let result = dispatch(command, config, &client, &tokens, llm.as_deref()).await;
    client.close().await?;
    result
}

async fn dispatch(
    command: Command,
    config: &Config,
    client: &PostgresClient,
    tokens: &TokenStore,
    llm: Option<&dyn LlmClient>,
) -> Result<CommandOutput> {
    let pool = client.pool();

    if command.requires_session() && config.auth.require_session {
        let user = AuthService::new(pool, tokens, config.auth.session_ttl_days)
            .require_user()
            .await?;
        debug!(user = %user.email, "Session verified");
    }

    let ctx = CommandContext {
        pool,
        db: client,
        config,
        tokens,
        llm,
        now: Utc::now(),
    };

    match command {
        Command::Migrate => {
            let applied = run_migrations(pool).await?;
            Ok(CommandOutput::new(&serde_json::json!({ "applied": applied }))?.info(
                if applied == 0 {
                    "Database is up to date".to_string()
                } else {
                    format!("Applied {applied} migration(s)")
                },
            ))
        }
        Command::Auth { command } => handlers::auth::handle(&ctx, command).await,
        Command::Customers { command } => handlers::customers::handle(&ctx, command).await,
        Command::Products { command } => handlers::products::handle(&ctx, command).await,
        Command::Sales { command } => handlers::sales::handle(&ctx, command).await,
        Command::Dashboard => handlers::analytics::dashboard(&ctx).await,
        Command::Analytics => handlers::analytics::analytics(&ctx).await,
        Command::Insights => handlers::analytics::insights(&ctx).await,
        Command::Ask { question, dry_run } => {
            handlers::queries::ask(&ctx, &question, dry_run).await
        }
        Command::Sql { query } => handlers::queries::sql(&ctx, &query).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "crm",
            "--database-url",
            "postgres://crm@db.example.com/crm",
            "--mock-llm",
            "dashboard",
        ])
        .unwrap();
        let mut config = Config::default();
        apply_cli_overrides(&mut config, &cli);

        assert_eq!(
            config.database.url.as_deref(),
            Some("postgres://crm@db.example.com/crm")
        );
        assert_eq!(config.llm.provider, "mock");
    }

    #[test]
    fn test_needs_llm() {
        assert!(needs_llm(&Command::Insights));
        assert!(needs_llm(&Command::Ask {
            question: "q".to_string(),
            dry_run: true
        }));
        assert!(!needs_llm(&Command::Dashboard));
    }

    #[tokio::test]
    async fn test_run_without_database_is_config_error() {
        let mut config = Config::default();
        config.database.url = None;
        config.database.database = None;
        let err = run(Command::Dashboard, &config).await.unwrap_err();
        assert!(matches!(err, CrmError::Config(_)));
    }
}
