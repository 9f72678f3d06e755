//! keepbill: staking customer billing reports.
//!
//! Reads a configuration file and a customer list, builds one cohort
//! snapshot from the chain data source and writes one report per customer.

mod billings;
mod config;
mod customers;
mod export;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::BillingConfig;

#[derive(Parser)]
#[command(name = "keepbill", version, about = "Staking customer billing reports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate billing reports for every configured customer.
    Billings {
        /// Path to the TOML configuration file.
        #[arg(long, env = "KEEPBILL_CONFIG", default_value = "./configs/config.toml")]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Billings { config } => {
            let config_path = config;
            let config = BillingConfig::load(&config_path)?;

            // Initialize tracing
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(format!("keepbill={}", config.logging.log_level).parse()?),
                )
                .init();

            info!(config = %config_path.display(), "keepbill starting");

            let outcome = billings::run(&config)?;

            for failure in &outcome.failures {
                warn!(
                    customer = %failure.customer.name,
                    error = %failure.error,
                    "report skipped"
                );
            }
            info!(
                written = outcome.reports.len(),
                skipped = outcome.failures.len(),
                "billings done"
            );
        }
    }

    Ok(())
}
