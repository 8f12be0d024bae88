//! Refresh command: recompute prices and show the result.

use anyhow::{Context, Result};
use lolmarket_stats::MarketStats;
use tracing::info;

use crate::cli::render;
use crate::session::{into_value, load, Session};

pub async fn run(session: &Session) -> Result<()> {
    let market = session.market().await?;
    let mut binding = session.bind_market(
        |resources, id| resources.market_stocks(id),
        session.options(),
    );
    let before = MarketStats::from_stocks(&load(&mut binding).await?);

    let delay = session.config.cache.refresh_delay();
    let (ack, refetch) = session
        .actions
        .refresh_prices(market.id, delay)
        .await
        .context("Failed to start price refresh")?;
    println!(
        "{}",
        ack.message
            .as_deref()
            .unwrap_or("Price refresh started")
    );
    info!(market = market.id, delay_ms = delay.as_millis() as u64, "waiting for recompute");

    // The backend recomputes asynchronously; market-scoped keys refetch after the delay.
    let started = refetch.await.context("Invalidation task failed")?;
    if started > 0 {
        binding.settled().await;
    }

    let view = binding.view();
    let fetched_at = view.fetched_at;
    let after = MarketStats::from_stocks(&into_value(view)?);
    println!();
    print!("{}", render::market_stats(&after));
    println!(
        "  Total Value Change:  {:+.2}",
        after.total_value - before.total_value
    );
    println!();
    println!("{}", render::updated(fetched_at, false));
    Ok(())
}
