//! Watch command: a live market overview.

use anyhow::Result;
use lolmarket_stats::MarketStats;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::{render, WatchArgs};
use crate::session::Session;

const DEFAULT_INTERVAL_SECS: u64 = 30;

pub async fn run(args: WatchArgs, session: &Session) -> Result<()> {
    let market = session.market().await?;
    let interval = args
        .interval
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .or_else(|| session.config.cache.poll_interval())
        .unwrap_or(Duration::from_secs(DEFAULT_INTERVAL_SECS));

    let mut options = session.options();
    options.poll_interval = Some(interval);
    let mut binding = session.bind_market(|resources, id| resources.market_stocks(id), options);

    info!(market = market.id, interval_secs = interval.as_secs(), "watching market");
    println!(
        "Watching {} every {}s. Press Ctrl+C to stop.",
        market.name,
        interval.as_secs()
    );

    let mut shown_at = None;
    let mut updates = 0;
    loop {
        let view = binding.view();
        if view.is_initialized && !view.is_refreshing && view.fetched_at != shown_at {
            if let Some(stocks) = &view.value {
                let stats = MarketStats::from_stocks(stocks);
                println!();
                print!("{}", render::market_stats(&stats));
                println!("{}", render::updated(view.fetched_at, false));
                shown_at = view.fetched_at;
                updates += 1;
            }
        }
        if let Some(error) = &view.error {
            if !view.is_refreshing {
                warn!(error = %error, "refresh failed, showing last known prices");
            }
        }
        if args.count.map_or(false, |count| updates >= count) {
            break;
        }

        tokio::select! {
            alive = binding.changed() => {
                if !alive {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("stopping watch");
                break;
            }
        }
    }

    Ok(())
}
