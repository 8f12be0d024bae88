//! Cacheable backend resources.
//!
//! Each method pairs a resource's [`CacheKey`] with a fetcher that calls the
//! [`ApiClient`], ready to be mounted by a [`lolmarket_cache::ViewBinding`].

use crate::client::ApiClient;
use lolmarket_cache::{Bound, CacheKey};
use lolmarket_core::fetch_fn;
use lolmarket_core::types::{
    Market, MarketDetails, MarketMember, ModelScore, Performers, Period, PricePoint, Stock,
    UserProfile,
};

/// Factory of bound resources over one API client.
#[derive(Debug, Clone)]
pub struct Resources {
    client: ApiClient,
}

impl Resources {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn user_markets(&self, user_id: &str) -> Bound<Vec<Market>> {
        let client = self.client.clone();
        let user = user_id.to_string();
        Bound::new(
            CacheKey::user_markets(user_id),
            fetch_fn(move || {
                let client = client.clone();
                let user = user.clone();
                async move { client.user_markets(&user).await }
            }),
        )
    }

    pub fn user_profile(&self, user_id: &str) -> Bound<UserProfile> {
        let client = self.client.clone();
        let user = user_id.to_string();
        Bound::new(
            CacheKey::user_profile(user_id),
            fetch_fn(move || {
                let client = client.clone();
                let user = user.clone();
                async move { client.user_profile(&user).await }
            }),
        )
    }

    pub fn market_stocks(&self, market_id: i64) -> Bound<Vec<Stock>> {
        let client = self.client.clone();
        Bound::new(
            CacheKey::market_stocks(market_id),
            fetch_fn(move || {
                let client = client.clone();
                async move { client.market_stocks(market_id).await }
            }),
        )
    }

    pub fn price_history(
        &self,
        market_id: i64,
        player_tag: &str,
        champion: Option<&str>,
        period: Period,
    ) -> Bound<Vec<PricePoint>> {
        let client = self.client.clone();
        let tag = player_tag.to_string();
        let champ = champion.map(str::to_string);
        Bound::new(
            CacheKey::price_history(market_id, player_tag, champion, period),
            fetch_fn(move || {
                let client = client.clone();
                let tag = tag.clone();
                let champ = champ.clone();
                async move {
                    client
                        .price_history(market_id, &tag, champ.as_deref(), period)
                        .await
                }
            }),
        )
    }

    pub fn model_scores(
        &self,
        market_id: i64,
        player_tag: &str,
        champion: Option<&str>,
    ) -> Bound<Vec<ModelScore>> {
        let client = self.client.clone();
        let tag = player_tag.to_string();
        let champ = champion.map(str::to_string);
        Bound::new(
            CacheKey::model_scores(market_id, player_tag, champion),
            fetch_fn(move || {
                let client = client.clone();
                let tag = tag.clone();
                let champ = champ.clone();
                async move { client.model_scores(market_id, &tag, champ.as_deref()).await }
            }),
        )
    }

    pub fn performers(&self, market_id: i64, period: Period) -> Bound<Performers> {
        let client = self.client.clone();
        Bound::new(
            CacheKey::performers(market_id, period),
            fetch_fn(move || {
                let client = client.clone();
                async move { client.performers(market_id, period).await }
            }),
        )
    }

    pub fn market_details(&self, market_id: i64) -> Bound<MarketDetails> {
        let client = self.client.clone();
        Bound::new(
            CacheKey::market_details(market_id),
            fetch_fn(move || {
                let client = client.clone();
                async move { client.market_details(market_id).await }
            }),
        )
    }

    /// Members of a market; the backend only lists them to its creator.
    pub fn market_members(&self, market_id: i64) -> Bound<Vec<MarketMember>> {
        let client = self.client.clone();
        Bound::new(
            CacheKey::market_members(market_id),
            fetch_fn(move || {
                let client = client.clone();
                async move { client.market_members(market_id).await }
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiConfig;

    #[test]
    fn test_bound_keys_match_cache_keys() {
        let resources = Resources::new(ApiClient::new(ApiConfig::default()).unwrap());

        assert_eq!(resources.market_stocks(4).key(), &CacheKey::market_stocks(4));
        assert_eq!(
            resources.user_markets("u1").key().as_str(),
            "user:u1:markets"
        );
        assert_eq!(
            resources
                .price_history(4, "Faker#KR1", Some("Ahri"), Period::Month)
                .key()
                .as_str(),
            "market:4:player:Faker%23KR1:Ahri:history:1m"
        );
        assert_eq!(
            resources.performers(4, Period::Day).key(),
            &CacheKey::performers(4, Period::Day)
        );
        assert_eq!(
            resources.model_scores(4, "Faker#KR1", None).key().as_str(),
            "market:4:player:Faker%23KR1:scores"
        );
        assert_eq!(resources.market_members(4).key().as_str(), "market:4:members");
    }
}
