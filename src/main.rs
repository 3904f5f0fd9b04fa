mod auth;
mod cli;
mod config;
mod engine;
mod error;
mod findings;
mod jenkins;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting JobLens - Jenkins Job & Parameter Audit Tool");
    cli.execute().await?;

    Ok(())
}
