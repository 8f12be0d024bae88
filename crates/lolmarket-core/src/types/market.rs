//! Markets and user profiles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A market the user belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub invite_code: Option<String>,
    #[serde(default)]
    pub member_count: Option<u32>,
}

/// A tracked player inside a market, with the champions that are listed for trading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInMarket {
    pub id: i64,
    pub player_tag: String,
    #[serde(default)]
    pub champions: Vec<String>,
}

/// Management view of a market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDetails {
    pub id: i64,
    pub name: String,
    pub invite_code: String,
    pub creator_id: String,
    pub tier: String,
    pub player_limit: u32,
    pub champions_per_player_limit: u32,
    #[serde(default)]
    pub players: Vec<PlayerInMarket>,
}

impl MarketDetails {
    /// Whether another player can be added under the market's tier limit.
    pub fn has_player_capacity(&self) -> bool {
        (self.players.len() as u32) < self.player_limit
    }

    /// Whether the user is the market's creator.
    pub fn is_creator(&self, user_id: &str) -> bool {
        self.creator_id == user_id
    }
}

/// A member of a market, as listed to its creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketMember {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl MarketMember {
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.id)
    }
}

/// Response to creating a market.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketCreated {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub invite_code: Option<String>,
}

/// Acknowledgement of a mutation request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Subscription tier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
    Pro,
}

impl SubscriptionTier {
    /// How many markets a user on this tier may create or join.
    pub fn market_limit(&self) -> usize {
        match self {
            SubscriptionTier::Free | SubscriptionTier::Premium => 1,
            SubscriptionTier::Pro => 3,
        }
    }

    /// Whether a user already in `joined` markets may create or join another.
    pub fn allows_another_market(&self, joined: usize) -> bool {
        joined < self.market_limit()
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Premium => "premium",
            SubscriptionTier::Pro => "pro",
        };
        write!(f, "{}", s)
    }
}

/// User profile as returned by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "tier_or_free")]
    pub subscription_tier: SubscriptionTier,
}

// The backend sends `null` for users that never subscribed.
fn tier_or_free<'de, D>(deserializer: D) -> Result<SubscriptionTier, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<SubscriptionTier>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_optional_fields() {
        let market: Market = serde_json::from_str(r#"{"id": 7, "name": "Worlds"}"#).unwrap();
        assert_eq!(market.id, 7);
        assert_eq!(market.invite_code, None);
    }

    #[test]
    fn test_profile_tier_defaults_to_free() {
        let missing: UserProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.subscription_tier, SubscriptionTier::Free);

        let null: UserProfile = serde_json::from_str(r#"{"subscription_tier": null}"#).unwrap();
        assert_eq!(null.subscription_tier, SubscriptionTier::Free);

        let pro: UserProfile = serde_json::from_str(r#"{"subscription_tier": "pro"}"#).unwrap();
        assert_eq!(pro.subscription_tier, SubscriptionTier::Pro);
    }

    #[test]
    fn test_tier_market_limits() {
        assert!(SubscriptionTier::Free.allows_another_market(0));
        assert!(!SubscriptionTier::Free.allows_another_market(1));
        assert!(!SubscriptionTier::Premium.allows_another_market(1));
        assert!(SubscriptionTier::Pro.allows_another_market(2));
        assert!(!SubscriptionTier::Pro.allows_another_market(3));
    }

    #[test]
    fn test_market_created_tolerates_sparse_body() {
        let created: MarketCreated =
            serde_json::from_str(r#"{"invite_code": "X7K2QP", "message": "ok"}"#).unwrap();
        assert_eq!(created.invite_code.as_deref(), Some("X7K2QP"));
        assert_eq!(created.id, None);
    }

    #[test]
    fn test_market_details_capacity() {
        let details = MarketDetails {
            id: 1,
            name: "Scrims".into(),
            invite_code: "ABC123".into(),
            creator_id: "user-a".into(),
            tier: "free".into(),
            player_limit: 1,
            champions_per_player_limit: 3,
            players: vec![PlayerInMarket {
                id: 4,
                player_tag: "Faker#KR1".into(),
                champions: vec!["Ahri".into()],
            }],
        };
        assert!(!details.has_player_capacity());
        assert!(details.is_creator("user-a"));
        assert!(!details.is_creator("user-b"));
    }
}
