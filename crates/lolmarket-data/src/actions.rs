//! Market mutations.
//!
//! Every mutation invalidates the cached resources it changes, so mounted views pick up
//! the result without waiting for a poll.

use crate::client::ApiClient;
use lolmarket_cache::{CacheKey, Invalidator};
use lolmarket_core::error::{MarketError, MarketResult};
use lolmarket_core::types::{Ack, MarketCreated, SubscriptionTier};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Fail when a user already in `joined` markets may not create or join another.
pub fn check_market_limit(tier: SubscriptionTier, joined: usize) -> MarketResult<()> {
    if tier.allows_another_market(joined) {
        Ok(())
    } else {
        Err(MarketError::MarketLimitReached {
            tier,
            limit: tier.market_limit(),
        })
    }
}

/// Market and roster mutations for one client.
#[derive(Debug, Clone)]
pub struct MarketActions {
    client: ApiClient,
    invalidator: Invalidator,
}

impl MarketActions {
    pub fn new(client: ApiClient, invalidator: Invalidator) -> Self {
        Self {
            client,
            invalidator,
        }
    }

    /// Create a market owned by `user_id`.
    ///
    /// `tier` and `joined` (markets the user is already in) enforce the plan's market limit
    /// before anything is sent.
    pub async fn create_market(
        &self,
        user_id: &str,
        name: &str,
        tier: SubscriptionTier,
        joined: usize,
    ) -> MarketResult<MarketCreated> {
        let name = non_empty(name, "market name")?;
        check_market_limit(tier, joined)?;

        let created = self.client.create_market(name, user_id).await?;
        info!(user = user_id, name, market = ?created.id, "market created");
        self.user_markets_changed(user_id);
        Ok(created)
    }

    /// Join a market by invite code. Same limit as [`create_market`](Self::create_market).
    pub async fn join_market(
        &self,
        user_id: &str,
        invite_code: &str,
        tier: SubscriptionTier,
        joined: usize,
    ) -> MarketResult<Ack> {
        let invite_code = non_empty(invite_code, "invite code")?;
        check_market_limit(tier, joined)?;

        let ack = self.client.join_market(invite_code, user_id).await?;
        info!(user = user_id, "market joined");
        self.user_markets_changed(user_id);
        Ok(ack)
    }

    pub async fn leave_market(&self, user_id: &str, market_id: i64) -> MarketResult<Ack> {
        let ack = self.client.leave_market(market_id, user_id).await?;
        info!(user = user_id, market = market_id, "market left");
        self.user_markets_changed(user_id);
        Ok(ack)
    }

    pub async fn delete_market(&self, user_id: &str, market_id: i64) -> MarketResult<Ack> {
        let ack = self.client.delete_market(market_id, user_id).await?;
        info!(user = user_id, market = market_id, "market deleted");
        self.user_markets_changed(user_id);
        Ok(ack)
    }

    pub async fn kick_member(
        &self,
        creator_id: &str,
        market_id: i64,
        member_id: &str,
    ) -> MarketResult<Ack> {
        let ack = self
            .client
            .kick_member(market_id, member_id, creator_id)
            .await?;
        info!(market = market_id, member = member_id, "member removed");
        self.market_changed(market_id);
        Ok(ack)
    }

    /// List `player_tag` (a Riot id such as `Faker#KR1`) in a market.
    pub async fn add_player(
        &self,
        user_id: &str,
        market_id: i64,
        player_tag: &str,
        initial_champion: &str,
    ) -> MarketResult<Ack> {
        let player_tag = player_tag.trim();
        if !player_tag.contains('#') {
            return Err(MarketError::InvalidInput(format!(
                "player tag {:?} must look like Name#TAG",
                player_tag
            )));
        }
        let champion = non_empty(initial_champion, "initial champion")?;

        let ack = self
            .client
            .add_player(market_id, player_tag, champion, user_id)
            .await?;
        info!(market = market_id, player = player_tag, champion, "player added");
        self.market_changed(market_id);
        Ok(ack)
    }

    pub async fn remove_player(&self, market_id: i64, player_id: i64) -> MarketResult<Ack> {
        let ack = self.client.remove_player(player_id).await?;
        info!(market = market_id, player = player_id, "player removed");
        self.market_changed(market_id);
        Ok(ack)
    }

    pub async fn add_champion(
        &self,
        market_id: i64,
        player_id: i64,
        champion: &str,
    ) -> MarketResult<Ack> {
        let champion = non_empty(champion, "champion")?;
        let ack = self.client.add_champion(player_id, champion).await?;
        info!(market = market_id, player = player_id, champion, "champion added");
        self.market_changed(market_id);
        Ok(ack)
    }

    pub async fn remove_champion(
        &self,
        market_id: i64,
        player_id: i64,
        champion: &str,
    ) -> MarketResult<Ack> {
        let ack = self.client.remove_champion(player_id, champion).await?;
        info!(market = market_id, player = player_id, champion, "champion removed");
        self.market_changed(market_id);
        Ok(ack)
    }

    /// Start a server-side price recompute and refetch the market's resources after `delay`.
    ///
    /// The returned task resolves to the number of refetches started.
    pub async fn refresh_prices(
        &self,
        market_id: i64,
        delay: Duration,
    ) -> MarketResult<(Ack, JoinHandle<usize>)> {
        let ack = self.client.refresh_market(market_id).await?;
        info!(
            market = market_id,
            delay_ms = delay.as_millis() as u64,
            "price refresh started"
        );
        let refetch = self
            .invalidator
            .invalidate_prefix_after(CacheKey::market_prefix(market_id), delay);
        Ok((ack, refetch))
    }

    fn user_markets_changed(&self, user_id: &str) {
        self.invalidator.invalidate(&[CacheKey::user_markets(user_id)]);
    }

    fn market_changed(&self, market_id: i64) {
        self.invalidator
            .invalidate_prefix(&CacheKey::market_prefix(market_id));
    }
}

fn non_empty<'a>(value: &'a str, what: &str) -> MarketResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(MarketError::InvalidInput(format!("{} is empty", what)))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiConfig;
    use crate::resources::Resources;
    use lolmarket_cache::{BindOptions, CacheStore, ViewBinding};
    use lolmarket_core::FetchError;
    use mockito::Matcher;
    use serde_json::json;

    fn client(url: &str) -> ApiClient {
        ApiClient::new(ApiConfig::new(url, Duration::from_secs(5))).unwrap()
    }

    fn offline() -> (CacheStore, MarketActions) {
        let store = CacheStore::default();
        let actions = MarketActions::new(
            client("http://127.0.0.1:9"),
            Invalidator::new(store.clone()),
        );
        (store, actions)
    }

    #[test]
    fn test_market_limit_by_tier() {
        assert!(check_market_limit(SubscriptionTier::Free, 0).is_ok());
        assert!(matches!(
            check_market_limit(SubscriptionTier::Premium, 1),
            Err(MarketError::MarketLimitReached { limit: 1, .. })
        ));
        assert!(check_market_limit(SubscriptionTier::Pro, 2).is_ok());
    }

    #[tokio::test]
    async fn test_limit_checked_before_request() {
        let (_store, actions) = offline();
        let err = actions
            .join_market("u1", "ABC123", SubscriptionTier::Free, 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MarketError::MarketLimitReached {
                tier: SubscriptionTier::Free,
                limit: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_input_validated_before_request() {
        let (_store, actions) = offline();
        assert!(matches!(
            actions.create_market("u1", "   ", SubscriptionTier::Pro, 0).await,
            Err(MarketError::InvalidInput(_))
        ));
        assert!(matches!(
            actions.add_player("u1", 7, "Faker", "Ahri").await,
            Err(MarketError::InvalidInput(_))
        ));
        assert!(matches!(
            actions.add_player("u1", 7, "Faker#KR1", "").await,
            Err(MarketError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_join_refetches_user_markets() {
        let mut server = mockito::Server::new_async().await;
        let markets = server
            .mock("GET", "/api/users/u1/markets")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 1, "name": "Worlds"}]"#)
            .expect(2)
            .create_async()
            .await;
        let join = server
            .mock("POST", "/api/markets/join")
            .match_body(Matcher::Json(json!({"invite_code": "ABC123", "user_id": "u1"})))
            .with_status(200)
            .with_body(r#"{"message": "Joined LCK"}"#)
            .create_async()
            .await;

        let store = CacheStore::default();
        let api = client(&server.url());
        let resources = Resources::new(api.clone());
        let mut binding =
            ViewBinding::mount_static(&store, resources.user_markets("u1"), BindOptions::default());
        binding.settled().await;

        let actions = MarketActions::new(api, Invalidator::new(store.clone()));
        let ack = actions
            .join_market("u1", " ABC123 ", SubscriptionTier::Pro, 1)
            .await
            .unwrap();
        assert_eq!(ack.message.as_deref(), Some("Joined LCK"));

        binding.settled().await;
        join.assert_async().await;
        markets.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_player_refetches_market_details() {
        let mut server = mockito::Server::new_async().await;
        let details = server
            .mock("GET", "/api/markets/7/manage")
            .with_status(200)
            .with_body(
                r#"{"id": 7, "name": "Scrims", "invite_code": "X7K2QP", "creator_id": "u1",
                    "tier": "free", "player_limit": 5, "champions_per_player_limit": 3,
                    "players": []}"#,
            )
            .expect(2)
            .create_async()
            .await;
        let add = server
            .mock("POST", "/api/markets/7/players")
            .match_body(Matcher::Json(json!({
                "player_tag": "Faker#KR1",
                "user_id": "u1",
                "initial_champion": "Ahri",
            })))
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let store = CacheStore::default();
        let api = client(&server.url());
        let resources = Resources::new(api.clone());
        let mut binding =
            ViewBinding::mount_static(&store, resources.market_details(7), BindOptions::default());
        binding.settled().await;

        let actions = MarketActions::new(api, Invalidator::new(store.clone()));
        let ack = actions.add_player("u1", 7, "Faker#KR1", "Ahri").await.unwrap();
        assert_eq!(ack, Ack::default());

        binding.settled().await;
        add.assert_async().await;
        details.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_mutation_keeps_backend_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/api/markets/players/4/champions/Ahri")
            .with_status(400)
            .with_body(r#"{"detail": "A player needs at least one champion"}"#)
            .create_async()
            .await;

        let store = CacheStore::default();
        let actions = MarketActions::new(client(&server.url()), Invalidator::new(store));
        let err = actions.remove_champion(7, 4, "Ahri").await.unwrap_err();
        match err {
            MarketError::Fetch(FetchError::Status { status, detail, .. }) => {
                assert_eq!(status, 400);
                assert_eq!(detail.as_deref(), Some("A player needs at least one champion"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
