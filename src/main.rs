//! League of Legends stock market CLI application.

mod cli;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use lolmarket_config::load_config_or_default;
use lolmarket_monitor::setup_logging;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::ValidateConfig => return cli::commands::validate::run(&cli.config).await,
        Commands::InitConfig(args) => return cli::commands::init::run(args, &cli.config).await,
        _ => {}
    }

    let config = load_config_or_default(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    // Setup logging
    let log_level = cli
        .log_level
        .map(|level| level.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let _log_guard = setup_logging(
        &log_level,
        cli.json_logs || config.logging.is_json(),
        config.logging.file.as_deref().map(Path::new),
    );

    let session = session::Session::start(config, cli.user.clone())?;

    // Execute command
    match cli.command {
        Commands::Markets => cli::commands::markets::run(&session).await,
        Commands::Select(args) => cli::commands::markets::select(args, &session).await,
        Commands::Overview(args) => cli::commands::overview::run(args, &session).await,
        Commands::History(args) => cli::commands::history::run(args, &session).await,
        Commands::Performers(args) => cli::commands::performers::run(args, &session).await,
        Commands::Details => cli::commands::details::run(&session).await,
        Commands::Profile => cli::commands::profile::run(&session).await,
        Commands::Watch(args) => cli::commands::watch::run(args, &session).await,
        Commands::Refresh => cli::commands::refresh::run(&session).await,
        Commands::Create(args) => cli::commands::manage::create(args, &session).await,
        Commands::Join(args) => cli::commands::manage::join(args, &session).await,
        Commands::Leave => cli::commands::manage::leave(&session).await,
        Commands::DeleteMarket(args) => cli::commands::manage::delete(args, &session).await,
        Commands::Members => cli::commands::manage::members(&session).await,
        Commands::Kick(args) => cli::commands::manage::kick(args, &session).await,
        Commands::Player(args) => cli::commands::roster::run(args, &session).await,
        Commands::ValidateConfig | Commands::InitConfig(_) => Ok(()),
    }
}
