//! slamon - SLA monitoring agent CLI
//!
//! Runs the daily analysis, self tests, batch assessment and reporting
//! against a local ticket database.

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slamon")]
#[command(about = "SLA monitoring agent for support ticket queues", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level (defaults to `app.log_level` from the config)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Database path (overrides SLAMON_DB_PATH and the config file)
    #[arg(long)]
    db_path: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daily analysis over the configured window
    Analyze,

    /// Run a self test (escalation, context or reasoning)
    Test {
        /// Which test to run
        kind: String,

        /// Look-back window for the context test, in hours
        #[arg(long)]
        hours_back: Option<u32>,
    },

    /// Risk-assess the most urgent stored tickets
    Assess {
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Build escalation plans for breached tickets
    Escalate {
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Write an SLA metrics report
    Report {
        /// Days of history to cover
        #[arg(short, long, default_value = "30")]
        days: u32,
    },

    /// Create the database and fill it with sample data
    Setup {
        /// Number of tickets to generate
        #[arg(short, long, default_value = "50")]
        tickets: usize,

        /// Seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List stored tickets
    Tickets {
        /// Filter by SLA status (within_sla, delayed, at_risk, breached)
        #[arg(short, long)]
        status: Option<String>,

        /// Filter by priority (P1-P5)
        #[arg(short, long)]
        priority: Option<String>,

        /// Filter by assigned team
        #[arg(short, long)]
        team: Option<String>,

        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = cli::helpers::load_config(cli.config.as_deref(), cli.db_path)?;
    let level = config.app.effective_log_level(cli.log_level.as_deref());

    // RUST_LOG wins when set; otherwise use the resolved level for our crates
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "slamon={lvl},slamon_core={lvl},libsql=warn",
            lvl = level.as_str().to_lowercase()
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("slamon v{} starting...", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Analyze => cli::analyze::handle(config).await?,
        Commands::Test { kind, hours_back } => cli::test::handle(config, &kind, hours_back).await?,
        Commands::Assess { limit } => cli::assess::handle(config, limit).await?,
        Commands::Escalate { limit } => cli::escalate::handle(config, limit).await?,
        Commands::Report { days } => cli::report::handle(config, days).await?,
        Commands::Setup { tickets, seed } => cli::setup::handle(config, tickets, seed).await?,
        Commands::Tickets {
            status,
            priority,
            team,
            limit,
        } => cli::tickets::handle(config, status, priority, team, limit).await?,
    }

    Ok(())
}
