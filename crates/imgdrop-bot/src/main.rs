//! imgdrop: chat bot that validates images and uploads them to Cloudflare Images.
//!
//! Configuration is read from the environment (and `.env`); see `imgdrop_core::config`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use imgdrop_core::Config;

#[derive(Parser)]
#[command(name = "imgdrop", version, about = "Image upload bot for Cloudflare Images")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Poll for updates and process uploads (default)
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    imgdrop_infra::init_telemetry(&config.logging)?;
    tracing::debug!(?config, "Configuration loaded");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => imgdrop_bot::server::run(config).await,
    }
}
