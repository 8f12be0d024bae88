//! Price history summaries.

use chrono::{DateTime, NaiveDateTime};
use lolmarket_core::types::{ModelScore, PricePoint};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Summary of a price chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub points: usize,
    pub first: f64,
    pub last: f64,
    pub high: f64,
    pub low: f64,
    /// `last - first`
    pub change: f64,
    /// Change relative to `first`, in percent. Zero when `first` is zero.
    pub change_pct: f64,
    /// Start of the chart, if its timestamp parses
    pub start: Option<NaiveDateTime>,
    /// End of the chart, if its timestamp parses
    pub end: Option<NaiveDateTime>,
}

impl HistorySummary {
    /// Summarize points in chronological order. `None` for an empty chart.
    pub fn from_points(points: &[PricePoint]) -> Option<Self> {
        let first = points.first()?;
        let last = points.last()?;
        let values = points.iter().map(|p| p.stock_value);
        let high = values.clone().fold(f64::NEG_INFINITY, f64::max);
        let low = values.fold(f64::INFINITY, f64::min);
        let change = last.stock_value - first.stock_value;
        let change_pct = if first.stock_value == 0.0 {
            0.0
        } else {
            change / first.stock_value * 100.0
        };

        Some(Self {
            points: points.len(),
            first: first.stock_value,
            last: last.stock_value,
            high,
            low,
            change,
            change_pct,
            start: parse_timestamp(&first.timestamp),
            end: parse_timestamp(&last.timestamp),
        })
    }
}

/// Summary of the model scores behind a price chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub games: usize,
    pub mean_score: f64,
    pub best_score: f64,
    pub worst_score: f64,
    /// Sum of per-game price changes
    pub net_change: f64,
}

impl ScoreSummary {
    pub fn from_scores(scores: &[ModelScore]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let values = scores.iter().map(|s| s.model_score);
        Some(Self {
            games: scores.len(),
            mean_score: values.clone().mean(),
            best_score: values.clone().fold(f64::NEG_INFINITY, f64::max),
            worst_score: values.fold(f64::INFINITY, f64::min),
            net_change: scores.iter().map(|s| s.price_change).sum(),
        })
    }
}

/// Parse a backend timestamp: RFC 3339, or ISO 8601 without an offset.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(value: f64, timestamp: &str) -> PricePoint {
        PricePoint {
            stock_value: value,
            timestamp: timestamp.to_string(),
            champion_played: None,
        }
    }

    fn score(model_score: f64, price_change: f64) -> ModelScore {
        ModelScore {
            model_score,
            timestamp: "2024-03-01T12:00:00".to_string(),
            stock_value: 10.0,
            previous_stock_value: None,
            price_change,
            formatted_time: String::new(),
            champion_played: None,
        }
    }

    #[test]
    fn test_history_summary() {
        let points = vec![
            point(10.0, "2024-03-01T12:00:00"),
            point(14.0, "2024-03-02T12:00:00.250"),
            point(8.0, "2024-03-03T12:00:00Z"),
            point(12.0, "2024-03-04 12:00:00"),
        ];
        let summary = HistorySummary::from_points(&points).unwrap();

        assert_eq!(summary.points, 4);
        assert_eq!(summary.high, 14.0);
        assert_eq!(summary.low, 8.0);
        assert!((summary.change - 2.0).abs() < 1e-9);
        assert!((summary.change_pct - 20.0).abs() < 1e-9);
        assert_eq!(summary.start.unwrap().to_string(), "2024-03-01 12:00:00");
        assert_eq!(summary.end.unwrap().to_string(), "2024-03-04 12:00:00");
    }

    #[test]
    fn test_empty_history() {
        assert!(HistorySummary::from_points(&[]).is_none());
        assert!(ScoreSummary::from_scores(&[]).is_none());
    }

    #[test]
    fn test_zero_start_has_no_percentage() {
        let summary =
            HistorySummary::from_points(&[point(0.0, "bad"), point(5.0, "bad")]).unwrap();
        assert_eq!(summary.change_pct, 0.0);
        assert!(summary.start.is_none());
    }

    #[test]
    fn test_score_summary() {
        let summary =
            ScoreSummary::from_scores(&[score(60.0, 1.5), score(40.0, -0.5), score(80.0, 2.0)])
                .unwrap();
        assert_eq!(summary.games, 3);
        assert!((summary.mean_score - 60.0).abs() < 1e-9);
        assert_eq!(summary.best_score, 80.0);
        assert_eq!(summary.worst_score, 40.0);
        assert!((summary.net_change - 3.0).abs() < 1e-9);
    }
}
