use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use comercia_ledger as ledger;

#[derive(Parser)]
#[command(name = "comercia-ledger", about = "Ledger operations CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all pending database migrations
    Migrate,
    /// Verify configuration and database connectivity
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let cfg = ledger::config::load_config().context("failed to load configuration")?;
    ledger::config::init_tracing(&cfg.log_level, cfg.log_json);

    let db_pool = ledger::db::establish_connection_from_app_config(&cfg).await?;

    match cli.command {
        Command::Migrate => {
            ledger::db::run_migrations(&db_pool).await?;
            info!("Migrations applied");
        }
        Command::Check => {
            ledger::db::check_connection(&db_pool).await?;
            info!(environment = %cfg.environment, "Configuration and database connection OK");
        }
    }

    ledger::db::close_pool(db_pool).await?;
    Ok(())
}
