//! Market overview statistics.

use crate::volatility::VolatilityBand;
use lolmarket_core::types::Stock;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Aggregates shown on the market overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    /// Number of listed stocks
    pub stock_count: usize,
    /// Sum of current prices
    pub total_value: f64,
    /// Mean current price
    pub average_price: f64,
    /// Stock with the largest 24h gain
    pub top_gainer: Option<Stock>,
    /// Stock with the largest 24h loss
    pub top_loser: Option<Stock>,
    /// Stocks up over 24h
    pub gainers: usize,
    /// Stocks down over 24h
    pub losers: usize,
    /// Mean absolute 24h change, in percent
    pub volatility_index: f64,
    /// Population standard deviation of the 24h change, in percent
    pub dispersion: f64,
    pub band: VolatilityBand,
}

impl MarketStats {
    /// Compute statistics over a market's stocks.
    pub fn from_stocks(stocks: &[Stock]) -> Self {
        let total_value: f64 = stocks.iter().map(|s| s.current_price).sum();
        let changes: Vec<f64> = stocks.iter().map(|s| s.price_change_percent_24h).collect();

        let average_price = if stocks.is_empty() {
            0.0
        } else {
            total_value / stocks.len() as f64
        };

        let volatility_index = if changes.is_empty() {
            0.0
        } else {
            changes.iter().map(|c| c.abs()).mean()
        };

        let dispersion = if changes.len() < 2 {
            0.0
        } else {
            changes.iter().population_std_dev()
        };

        Self {
            stock_count: stocks.len(),
            total_value,
            average_price,
            top_gainer: extreme(stocks, |candidate, best| candidate > best),
            top_loser: extreme(stocks, |candidate, best| candidate < best),
            gainers: stocks.iter().filter(|s| s.price_change_percent_24h > 0.0).count(),
            losers: stocks.iter().filter(|s| s.price_change_percent_24h < 0.0).count(),
            volatility_index,
            dispersion,
            band: VolatilityBand::from_index(volatility_index),
        }
    }

    /// One-line summary for terminal output.
    pub fn summary(&self) -> String {
        format!(
            "{} stocks, total value {:.2}, volatility {} ({:.1}% avg change)",
            self.stock_count, self.total_value, self.band, self.volatility_index
        )
    }
}

/// First stock whose 24h change beats every earlier one under `better`.
fn extreme(stocks: &[Stock], better: impl Fn(f64, f64) -> bool) -> Option<Stock> {
    let mut best: Option<&Stock> = None;
    for stock in stocks {
        match best {
            Some(current)
                if !better(stock.price_change_percent_24h, current.price_change_percent_24h) => {}
            _ => best = Some(stock),
        }
    }
    best.cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(tag: &str, price: f64, change_pct: f64) -> Stock {
        Stock {
            player_tag: tag.to_string(),
            champion: None,
            champions: vec![],
            current_price: price,
            price_change_24h: 0.0,
            price_change_percent_24h: change_pct,
            price_change_7d: 0.0,
            price_change_percent_7d: 0.0,
            last_update: None,
        }
    }

    #[test]
    fn test_empty_market() {
        let stats = MarketStats::from_stocks(&[]);
        assert_eq!(stats.stock_count, 0);
        assert_eq!(stats.total_value, 0.0);
        assert_eq!(stats.average_price, 0.0);
        assert_eq!(stats.volatility_index, 0.0);
        assert_eq!(stats.dispersion, 0.0);
        assert!(stats.top_gainer.is_none());
        assert_eq!(stats.band, VolatilityBand::Low);
    }

    #[test]
    fn test_market_aggregates() {
        let stocks = vec![
            stock("A#1", 10.0, 2.0),
            stock("B#1", 20.0, -4.0),
            stock("C#1", 30.0, 6.0),
        ];
        let stats = MarketStats::from_stocks(&stocks);

        assert_eq!(stats.stock_count, 3);
        assert!((stats.total_value - 60.0).abs() < 1e-9);
        assert!((stats.average_price - 20.0).abs() < 1e-9);
        assert_eq!(stats.top_gainer.unwrap().player_tag, "C#1");
        assert_eq!(stats.top_loser.unwrap().player_tag, "B#1");
        assert_eq!(stats.gainers, 2);
        assert_eq!(stats.losers, 1);
        assert!((stats.volatility_index - 4.0).abs() < 1e-9);
        assert_eq!(stats.band, VolatilityBand::High);
        // mean 4/3, population variance (0.4444 + 28.4444 + 21.7778) / 3
        assert!((stats.dispersion - 4.1096).abs() < 1e-3);
    }

    #[test]
    fn test_top_gainer_ties_keep_first() {
        let stocks = vec![stock("A#1", 1.0, 3.0), stock("B#1", 1.0, 3.0)];
        let stats = MarketStats::from_stocks(&stocks);
        assert_eq!(stats.top_gainer.unwrap().player_tag, "A#1");
    }

    #[test]
    fn test_single_stock_has_no_dispersion() {
        let stats = MarketStats::from_stocks(&[stock("A#1", 5.0, -1.0)]);
        assert_eq!(stats.dispersion, 0.0);
        assert_eq!(stats.band, VolatilityBand::Low);
        assert_eq!(
            stats.summary(),
            "1 stocks, total value 5.00, volatility Low (1.0% avg change)"
        );
    }
}
