//! Aggregate statistics over fetched market data.

pub mod history;
pub mod market_stats;
pub mod volatility;

pub use history::{parse_timestamp, HistorySummary, ScoreSummary};
pub use market_stats::MarketStats;
pub use volatility::VolatilityBand;
