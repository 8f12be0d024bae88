//! Market overview command.

use anyhow::Result;
use lolmarket_stats::MarketStats;

use crate::cli::{render, OverviewArgs};
use crate::session::{load, Session};

pub async fn run(args: OverviewArgs, session: &Session) -> Result<()> {
    let market = session.market().await?;
    let mut binding = session.bind_market(
        |resources, id| resources.market_stocks(id),
        session.options(),
    );
    let stocks = load(&mut binding).await?;
    let stats = MarketStats::from_stocks(&stocks);

    match args.output.as_str() {
        "json" => {
            let json = serde_json::json!({
                "market": market,
                "stats": stats,
                "stocks": stocks.as_ref(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        _ => {
            print!("{}", render::header(&market.name.to_uppercase()));
            println!();
            print!("{}", render::market_stats(&stats));
            println!();
            print!("{}", render::stock_table(&stocks, args.top));
            println!();
            println!("{}", render::updated(binding.view().fetched_at, false));
        }
    }

    Ok(())
}
