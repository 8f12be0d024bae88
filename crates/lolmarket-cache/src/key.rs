//! Cache keys.

use lolmarket_core::types::Period;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use urlencoding::encode;

/// Identity of a cached resource.
///
/// Keys are plain strings built from the resource's logical inputs, so the same inputs
/// always produce the same key. Free-form inputs (user ids, player tags, champions) are
/// percent-encoded, so they never contain the `:` separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Markets a user belongs to.
    pub fn user_markets(user_id: &str) -> Self {
        Self(format!("user:{}:markets", segment(user_id)))
    }

    pub fn user_profile(user_id: &str) -> Self {
        Self(format!("user:{}:profile", segment(user_id)))
    }

    /// All stocks listed in a market.
    pub fn market_stocks(market_id: i64) -> Self {
        Self(format!("market:{}:stocks", market_id))
    }

    pub fn market_details(market_id: i64) -> Self {
        Self(format!("market:{}:details", market_id))
    }

    pub fn market_members(market_id: i64) -> Self {
        Self(format!("market:{}:members", market_id))
    }

    pub fn performers(market_id: i64, period: Period) -> Self {
        Self(format!("market:{}:performers:{}", market_id, period))
    }

    /// Price history of a player, or of one of the player's champions.
    pub fn price_history(
        market_id: i64,
        player_tag: &str,
        champion: Option<&str>,
        period: Period,
    ) -> Self {
        match champion {
            Some(champion) => Self(format!(
                "market:{}:player:{}:{}:history:{}",
                market_id,
                segment(player_tag),
                segment(champion),
                period
            )),
            None => Self(format!(
                "market:{}:player:{}:history:{}",
                market_id,
                segment(player_tag),
                period
            )),
        }
    }

    pub fn model_scores(market_id: i64, player_tag: &str, champion: Option<&str>) -> Self {
        match champion {
            Some(champion) => Self(format!(
                "market:{}:player:{}:{}:scores",
                market_id,
                segment(player_tag),
                segment(champion)
            )),
            None => Self(format!(
                "market:{}:player:{}:scores",
                market_id,
                segment(player_tag)
            )),
        }
    }

    /// Prefix shared by every key scoped to a market.
    pub fn market_prefix(market_id: i64) -> String {
        format!("market:{}:", market_id)
    }

    /// Prefix shared by every key scoped to a user.
    pub fn user_prefix(user_id: &str) -> String {
        format!("user:{}:", segment(user_id))
    }
}

fn segment(value: &str) -> Cow<'_, str> {
    encode(value)
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}
