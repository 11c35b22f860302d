mod api;
mod cli;
mod db;
mod error;
mod ingest;
mod logging;
mod models;
mod query;
mod routes;
mod scheduler;

use anyhow::Context;
use clap::Parser;
use cli::{App, Cli};
use colored::*;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Keep the guard alive so the file writer flushes on exit
    let _log_guard = logging::init(cli.log_dir.as_deref(), cli.log_json)
        .context("failed to initialise logging")?;

    info!("Initializing weather station service...");

    let app = match App::from_cli(&cli).await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {:?}", e);
            eprintln!(
                "{}",
                "Error: Failed to initialize application. Check logs.".red()
            );
            return Err(e.into());
        },
    };

    if let Err(e) = app.run(cli.command).await {
        error!("Command execution failed: {:?}", e);
        eprintln!("{} {}", "Error executing command:".red(), e.to_string().red());
        return Err(e.into());
    }

    Ok(())
}
