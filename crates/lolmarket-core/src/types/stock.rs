//! Stocks and performer rankings.

use serde::{Deserialize, Serialize};

/// A tradeable player stock, optionally scoped to a champion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub player_tag: String,
    /// Champion for player-champion stocks.
    #[serde(default)]
    pub champion: Option<String>,
    /// Champions listed for a player-level stock.
    #[serde(default)]
    pub champions: Vec<String>,
    pub current_price: f64,
    #[serde(default)]
    pub price_change_24h: f64,
    #[serde(default)]
    pub price_change_percent_24h: f64,
    #[serde(default)]
    pub price_change_7d: f64,
    #[serde(default)]
    pub price_change_percent_7d: f64,
    #[serde(default)]
    pub last_update: Option<String>,
}

impl Stock {
    /// Riot ID without the tagline (`Faker#KR1` -> `Faker`).
    pub fn display_name(&self) -> &str {
        display_name(&self.player_tag)
    }

    pub fn is_gaining(&self) -> bool {
        self.price_change_percent_24h > 0.0
    }
}

/// Top or bottom performer over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub player_tag: String,
    pub champion: String,
    pub current_price: f64,
    pub price_change_percent: f64,
}

impl Performer {
    pub fn display_name(&self) -> &str {
        display_name(&self.player_tag)
    }
}

/// Performer leaderboard for a market.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Performers {
    #[serde(default)]
    pub top_performers: Vec<Performer>,
    #[serde(default)]
    pub bottom_performers: Vec<Performer>,
}

impl Performers {
    pub fn is_empty(&self) -> bool {
        self.top_performers.is_empty() && self.bottom_performers.is_empty()
    }
}

fn display_name(player_tag: &str) -> &str {
    player_tag.split('#').next().unwrap_or(player_tag)
}
