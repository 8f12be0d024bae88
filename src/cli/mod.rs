//! CLI definitions.

pub mod commands;
pub mod render;

use clap::{Parser, Subcommand, ValueEnum};
use lolmarket_core::types::Period;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lolmarket")]
#[command(author, version, about = "Terminal client for the League of Legends player stock market")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level (defaults to the configured level)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    /// Act as this user instead of the configured one
    #[arg(short, long, env = "LOLMARKET_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List your markets
    Markets,
    /// Select the market other commands work on
    Select(SelectArgs),
    /// Stocks and statistics of the selected market
    Overview(OverviewArgs),
    /// Price history of a player or champion
    History(HistoryArgs),
    /// Top and bottom performers
    Performers(PerformersArgs),
    /// Settings and roster of the selected market
    Details,
    /// Your subscription tier
    Profile,
    /// Keep the market overview up to date
    Watch(WatchArgs),
    /// Ask the backend to recompute prices, then show the new overview
    Refresh,
    /// Create a market
    Create(CreateArgs),
    /// Join a market with an invite code
    Join(JoinArgs),
    /// Leave the selected market
    Leave,
    /// Delete the selected market (creator only)
    DeleteMarket(DeleteArgs),
    /// Members of the selected market (creator only)
    Members,
    /// Remove a member from the selected market (creator only)
    Kick(KickArgs),
    /// Manage the players listed in the selected market
    Player(PlayerArgs),
    /// Validate configuration
    ValidateConfig,
    /// Write a default configuration file
    InitConfig(InitConfigArgs),
}

#[derive(clap::Args)]
pub struct SelectArgs {
    /// Market id
    pub market_id: i64,
}

#[derive(clap::Args)]
pub struct OverviewArgs {
    /// Only show the top N stocks by price
    #[arg(short, long)]
    pub top: Option<usize>,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub output: String,
}

#[derive(clap::Args)]
pub struct HistoryArgs {
    /// Player tag, e.g. "Faker#KR1"
    pub player: String,

    /// Champion, for player-champion stocks
    #[arg(long)]
    pub champion: Option<String>,

    /// Period (1d, 1w, 1m, all)
    #[arg(short, long, default_value = "1w")]
    pub period: Period,

    /// Also show the model scores behind the price moves
    #[arg(long)]
    pub scores: bool,
}

#[derive(clap::Args)]
pub struct PerformersArgs {
    /// Period (1d, 1w, 1m, all)
    #[arg(short, long, default_value = "1d")]
    pub period: Period,
}

#[derive(clap::Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds (defaults to the configured poll interval, else 30)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Stop after this many updates
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(clap::Args)]
pub struct CreateArgs {
    /// Market name
    pub name: String,
}

#[derive(clap::Args)]
pub struct JoinArgs {
    /// Invite code shared by the market's creator
    pub invite_code: String,
}

#[derive(clap::Args)]
pub struct DeleteArgs {
    /// Confirm the deletion
    #[arg(long)]
    pub confirm: bool,
}

#[derive(clap::Args)]
pub struct KickArgs {
    /// User id of the member
    pub member_id: String,
}

#[derive(clap::Args)]
pub struct PlayerArgs {
    #[command(subcommand)]
    pub command: PlayerCommand,
}

#[derive(Subcommand)]
pub enum PlayerCommand {
    /// List a player with their first champion
    Add {
        /// Player tag, e.g. "Faker#KR1"
        tag: String,
        champion: String,
    },
    /// Delist a player and their champions
    Remove { tag: String },
    /// List another champion for a player
    AddChampion { tag: String, champion: String },
    /// Delist one of a player's champions
    RemoveChampion { tag: String, champion: String },
}

#[derive(clap::Args)]
pub struct InitConfigArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
