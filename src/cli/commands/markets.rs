//! Market list and selection commands.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{render, SelectArgs};
use crate::session::{into_value, Session};

pub async fn run(session: &Session) -> Result<()> {
    session.user_id()?;
    session.markets.ready().await;

    let markets = into_value(session.markets.markets()).context("Failed to load your markets")?;
    print!("{}", render::markets(&markets, session.markets.selected_id()));
    Ok(())
}

pub async fn select(args: SelectArgs, session: &Session) -> Result<()> {
    session.user_id()?;
    session.markets.ready().await;

    let market = session
        .markets
        .select(args.market_id)
        .with_context(|| format!("Cannot select market {}", args.market_id))?;
    info!(market = market.id, "selection saved");
    println!("Selected market {} ({})", market.name, market.id);
    Ok(())
}
