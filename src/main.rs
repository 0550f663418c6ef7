//! crm - CRM back office with AI-assisted SQL and sales insights.

use crm_insight::app::{self, apply_cli_overrides};
use crm_insight::cli::Cli;
use crm_insight::commands::CommandOutput;
use crm_insight::config::Config;
use crm_insight::error::Result;
use crm_insight::logging;
use crm_insight::query::ErrorBody;
use tracing::{debug, error};

#[tokio::main]
async fn main() {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    let log_to_file = cli.log_file;
    if log_to_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    let json = cli.json;
    match run(cli).await {
        Ok(output) => println!("{}", output.render(json)),
        Err(e) => {
            if log_to_file {
                error!("{}: {}", e.category(), e);
            }
            if json {
                let body = ErrorBody::for_execution(&e);
                if let Ok(text) = serde_json::to_string_pretty(&body) {
                    println!("{text}");
                }
            }
            eprintln!("{}", e.report());
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<CommandOutput> {
    let config_path = cli.config_path();
    debug!("Loading config from: {}", config_path.display());
    let mut config = Config::load(&config_path)?;
    apply_cli_overrides(&mut config, &cli);

    app::run(cli.command, &config).await
}
