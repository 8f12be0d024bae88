//! Price history and model scores.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lookback period for price history and performer rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Period {
    #[serde(rename = "1d")]
    Day,
    #[serde(rename = "1w")]
    #[default]
    Week,
    #[serde(rename = "1m")]
    Month,
    #[serde(rename = "all")]
    All,
}

impl Period {
    /// Query-string form used by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "1d",
            Period::Week => "1w",
            Period::Month => "1m",
            Period::All => "all",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1d" | "day" => Ok(Period::Day),
            "1w" | "week" => Ok(Period::Week),
            "1m" | "month" => Ok(Period::Month),
            "all" => Ok(Period::All),
            _ => Err(format!("Invalid period: {}", s)),
        }
    }
}

/// A point on a stock's price chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub stock_value: f64,
    pub timestamp: String,
    #[serde(default)]
    pub champion_played: Option<String>,
}

/// Score the pricing model assigned to one game, and its effect on the price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub model_score: f64,
    pub timestamp: String,
    pub stock_value: f64,
    #[serde(default)]
    pub previous_stock_value: Option<f64>,
    #[serde(default)]
    pub price_change: f64,
    #[serde(default)]
    pub formatted_time: String,
    #[serde(default)]
    pub champion_played: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parsing() {
        assert_eq!("1d".parse::<Period>().unwrap(), Period::Day);
        assert_eq!("WEEK".parse::<Period>().unwrap(), Period::Week);
        assert_eq!("all".parse::<Period>().unwrap(), Period::All);
        assert!("2y".parse::<Period>().is_err());
        assert_eq!(Period::default().to_string(), "1w");
    }

    #[test]
    fn test_period_serde_matches_query_form() {
        let json = serde_json::to_string(&Period::Month).unwrap();
        assert_eq!(json, "\"1m\"");
    }

    #[test]
    fn test_model_score_nullable_previous() {
        let json = r#"{
            "model_score": 7.25,
            "timestamp": "2024-05-01T12:00:00",
            "stock_value": 41.0,
            "previous_stock_value": null,
            "price_change": 0.0,
            "formatted_time": "May 1, 12:00"
        }"#;
        let score: ModelScore = serde_json::from_str(json).unwrap();
        assert_eq!(score.previous_stock_value, None);
        assert_eq!(score.champion_played, None);
    }
}
