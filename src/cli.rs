//! Command-line argument parsing for crm-insight.

use crate::auth::{ProfileUpdate, User};
use crate::records::{CustomerFilter, CustomerStatus, RECENT_SALES_LIMIT};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// CRM back office with AI-assisted SQL and sales insights.
#[derive(Parser, Debug)]
#[command(name = "crm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Print the JSON body instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// PostgreSQL connection string (overrides config and DATABASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub database_url: Option<String>,

    /// Write logs to the state directory instead of stderr
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Use canned LLM responses instead of the configured provider
    #[arg(long, global = true)]
    pub mock_llm: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or upgrade the CRM tables
    Migrate,

    /// Sign up, sign in and manage the profile
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Manage customers
    Customers {
        #[command(subcommand)]
        command: CustomerCommand,
    },

    /// Manage the product catalog
    Products {
        #[command(subcommand)]
        command: ProductCommand,
    },

    /// Record and list sales
    Sales {
        #[command(subcommand)]
        command: SalesCommand,
    },

    /// Overview: revenue, customers, category charts and recent sales
    Dashboard,

    /// Monthly sales with predictions and category performance
    Analytics,

    /// AI-generated sales insights
    Insights,

    /// Ask a question about the CRM data in plain language
    Ask {
        question: String,

        /// Only generate the SQL, do not run it
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a read-only SQL query
    Sql { query: String },
}

impl Command {
    /// Commands that need a signed-in user when sessions are required.
    pub fn requires_session(&self) -> bool {
        !matches!(self, Self::Migrate | Self::Auth { .. })
    }
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        email: String,

        /// Full name
        #[arg(long)]
        name: String,

        #[arg(long, env = "CRM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign in with email and password
    Signin {
        #[arg(long)]
        email: String,

        #[arg(long, env = "CRM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the current session
    Signout,

    /// Show the signed-in user
    Whoami,

    /// Show the profile, or update it when any field is given
    Profile(ProfileArgs),
}

#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub image_url: Option<String>,
}

impl ProfileArgs {
    pub fn is_update(&self) -> bool {
        self.first_name.is_some()
            || self.last_name.is_some()
            || self.email.is_some()
            || self.image_url.is_some()
    }

    /// Fields not given keep their current value.
    pub fn merge(&self, current: &User) -> ProfileUpdate {
        ProfileUpdate {
            first_name: self
                .first_name
                .clone()
                .unwrap_or_else(|| current.first_name.clone()),
            last_name: self
                .last_name
                .clone()
                .unwrap_or_else(|| current.last_name.clone()),
            email: self.email.clone().unwrap_or_else(|| current.email.clone()),
            image_url: self.image_url.clone().or_else(|| current.image_url.clone()),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CustomerCommand {
    /// List customers with their sales summary
    List(CustomerListArgs),

    /// Show one customer
    Show { id: Uuid },

    /// Add a customer
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        company: Option<String>,

        #[arg(long, default_value = "active")]
        status: CustomerStatus,
    },

    /// Change fields of a customer
    Update {
        id: Uuid,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// New phone number; an empty value clears it
        #[arg(long)]
        phone: Option<String>,

        /// New company; an empty value clears it
        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        status: Option<CustomerStatus>,
    },

    /// Delete a customer
    Delete { id: Uuid },

    /// Customer totals, average order value and retention
    Stats,
}

#[derive(Args, Debug, Default)]
pub struct CustomerListArgs {
    /// Match name or email
    #[arg(long)]
    pub search: Option<String>,

    /// Comma-separated statuses
    #[arg(long, value_delimiter = ',')]
    pub status: Vec<CustomerStatus>,

    /// Created on or after (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Created on or before (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    #[arg(long)]
    pub min_orders: Option<i64>,

    #[arg(long)]
    pub min_spent: Option<f64>,
}

fn at_time(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    date.and_time(time).and_utc()
}

impl CustomerListArgs {
    /// Date bounds cover whole UTC days.
    pub fn to_filter(&self) -> CustomerFilter {
        CustomerFilter {
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            statuses: self.status.clone(),
            created_from: self.from.map(|d| at_time(d, NaiveTime::MIN)),
            created_to: self.to.and_then(|d| {
                NaiveTime::from_hms_opt(23, 59, 59).map(|end| at_time(d, end))
            }),
            min_orders: self.min_orders,
            min_spent: self.min_spent,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ProductCommand {
    /// List products, 20 per page
    List {
        #[arg(long)]
        search: Option<String>,

        /// Category name, or "all"
        #[arg(long)]
        category: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: i64,
    },

    /// Show one product
    Show { id: Uuid },

    /// Add a product
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        category: String,

        #[arg(long)]
        price: f64,

        #[arg(long)]
        description: String,

        #[arg(long)]
        photo_url: Option<String>,
    },

    /// Change fields of a product
    Update {
        id: Uuid,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        price: Option<f64>,

        #[arg(long)]
        description: Option<String>,

        /// New photo URL; an empty value clears it
        #[arg(long)]
        photo_url: Option<String>,

        #[arg(long)]
        stock: Option<i32>,
    },

    /// Delete a product
    Delete { id: Uuid },

    /// List product categories
    Categories,
}

#[derive(Subcommand, Debug)]
pub enum SalesCommand {
    /// Record a sale
    Add {
        #[arg(long)]
        customer: Uuid,

        #[arg(long)]
        product: Uuid,

        #[arg(long, default_value_t = 1)]
        quantity: i32,

        /// Defaults to product price times quantity
        #[arg(long)]
        total: Option<f64>,

        /// Defaults to "completed"
        #[arg(long)]
        status: Option<String>,
    },

    /// Latest sales
    Recent {
        #[arg(long, default_value_t = RECENT_SALES_LIMIT)]
        limit: i64,
    },
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path (custom or default).
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("crm").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["sql", "SELECT 1", "--json", "--mock-llm"]);
        assert!(cli.json);
        assert!(cli.mock_llm);
        assert!(matches!(cli.command, Command::Sql { ref query } if query == "SELECT 1"));
    }

    #[test]
    fn test_ask_dry_run() {
        let cli = parse(&["ask", "top products", "--dry-run"]);
        assert!(matches!(
            cli.command,
            Command::Ask { ref question, dry_run: true } if question == "top products"
        ));
    }

    #[test]
    fn test_customer_list_filter() {
        let cli = parse(&[
            "customers",
            "list",
            "--status",
            "active,inactive",
            "--from",
            "2025-01-01",
            "--to",
            "2025-01-31",
            "--min-orders",
            "2",
        ]);
        let Command::Customers {
            command: CustomerCommand::List(args),
        } = cli.command
        else {
            panic!("expected customers list");
        };

        let filter = args.to_filter();
        assert_eq!(
            filter.statuses,
            vec![CustomerStatus::Active, CustomerStatus::Inactive]
        );
        assert_eq!(
            filter.created_from.unwrap().to_rfc3339(),
            "2025-01-01T00:00:00+00:00"
        );
        assert_eq!(
            filter.created_to.unwrap().to_rfc3339(),
            "2025-01-31T23:59:59+00:00"
        );
        assert_eq!(filter.min_orders, Some(2));
    }

    #[test]
    fn test_invalid_status_is_rejected() {
        let result = Cli::try_parse_from(["crm", "customers", "add", "--name", "Jo", "--email", "jo@x.io", "--status", "vip"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_product_list_defaults() {
        let cli = parse(&["products", "list"]);
        assert!(matches!(
            cli.command,
            Command::Products {
                command: ProductCommand::List { page: 1, .. }
            }
        ));
    }

    #[test]
    fn test_sales_recent_default_limit() {
        let cli = parse(&["sales", "recent"]);
        assert!(matches!(
            cli.command,
            Command::Sales {
                command: SalesCommand::Recent { limit: 5 }
            }
        ));
    }

    #[test]
    fn test_requires_session() {
        assert!(!parse(&["migrate"]).command.requires_session());
        assert!(!parse(&["auth", "whoami"]).command.requires_session());
        assert!(parse(&["dashboard"]).command.requires_session());
        assert!(parse(&["sql", "SELECT 1"]).command.requires_session());
    }

    #[test]
    fn test_profile_merge_keeps_current_values() {
        let current = User {
            id: Uuid::nil(),
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            image_url: Some("https://example.com/ada.png".to_string()),
            created_at: Utc::now(),
        };
        let args = ProfileArgs {
            last_name: Some("King".to_string()),
            ..Default::default()
        };
        assert!(args.is_update());

        let update = args.merge(&current);
        assert_eq!(update.first_name, "Ada");
        assert_eq!(update.last_name, "King");
        assert_eq!(update.email, "ada@example.com");
        assert_eq!(update.image_url.as_deref(), Some("https://example.com/ada.png"));
        assert!(!ProfileArgs::default().is_update());
    }
}
