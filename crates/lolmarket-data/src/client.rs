//! Backend REST API client.

use lolmarket_core::error::FetchError;
use lolmarket_core::types::{
    Ack, Market, MarketCreated, MarketDetails, MarketMember, ModelScore, Performers, Period,
    PricePoint, Stock, UserProfile,
};
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000", Duration::from_secs(10))
    }
}

/// Typed client for the market backend.
///
/// Each method is one network call; caching and retry policy belong to the caller.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    client: Client,
}

impl ApiClient {
    /// Create a new client.
    pub fn new(config: ApiConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FetchError::Network(format!("invalid base url {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Network(format!(
                "invalid base url {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Markets the user belongs to.
    pub async fn user_markets(&self, user_id: &str) -> Result<Vec<Market>, FetchError> {
        self.get(self.url(&["api", "users", user_id, "markets"]), &[])
            .await
    }

    pub async fn user_profile(&self, user_id: &str) -> Result<UserProfile, FetchError> {
        self.get(self.url(&["api", "users", user_id, "profile"]), &[])
            .await
    }

    /// Every stock listed in a market.
    pub async fn market_stocks(&self, market_id: i64) -> Result<Vec<Stock>, FetchError> {
        let market = market_id.to_string();
        self.get(self.url(&["api", "markets", &market, "stocks"]), &[])
            .await
    }

    /// Price history of a player, or of one champion when `champion` is set.
    pub async fn price_history(
        &self,
        market_id: i64,
        player_tag: &str,
        champion: Option<&str>,
        period: Period,
    ) -> Result<Vec<PricePoint>, FetchError> {
        let url = self.stock_url(market_id, player_tag, champion, "history");
        self.get(url, &[("period", period.as_str())]).await
    }

    /// Model scores behind a player's (or champion's) price moves.
    pub async fn model_scores(
        &self,
        market_id: i64,
        player_tag: &str,
        champion: Option<&str>,
    ) -> Result<Vec<ModelScore>, FetchError> {
        let url = self.stock_url(market_id, player_tag, champion, "scores");
        self.get(url, &[]).await
    }

    /// Best and worst movers over `period`.
    pub async fn performers(&self, market_id: i64, period: Period) -> Result<Performers, FetchError> {
        let market = market_id.to_string();
        let url = self.url(&["api", "markets", &market, "performers"]);
        self.get(url, &[("period", period.as_str())]).await
    }

    /// Market settings and roster.
    pub async fn market_details(&self, market_id: i64) -> Result<MarketDetails, FetchError> {
        let market = market_id.to_string();
        self.get(self.url(&["api", "markets", &market, "manage"]), &[])
            .await
    }

    /// Members of a market.
    pub async fn market_members(&self, market_id: i64) -> Result<Vec<MarketMember>, FetchError> {
        let market = market_id.to_string();
        self.get(self.url(&["api", "markets", &market, "members"]), &[])
            .await
    }

    /// Ask the backend to recompute prices. The recompute runs asynchronously on the server.
    pub async fn refresh_market(&self, market_id: i64) -> Result<Ack, FetchError> {
        let market = market_id.to_string();
        let url = self.url(&["api", "markets", &market, "refresh"]);
        self.send(Method::POST, url, None).await
    }

    pub async fn create_market(
        &self,
        name: &str,
        creator_id: &str,
    ) -> Result<MarketCreated, FetchError> {
        let url = self.url(&["api", "markets", "create"]);
        let body = json!({ "name": name, "creator_id": creator_id });
        self.send(Method::POST, url, Some(body)).await
    }

    pub async fn join_market(&self, invite_code: &str, user_id: &str) -> Result<Ack, FetchError> {
        let url = self.url(&["api", "markets", "join"]);
        let body = json!({ "invite_code": invite_code, "user_id": user_id });
        self.send(Method::POST, url, Some(body)).await
    }

    /// Creator only. Removes the market for every member.
    pub async fn delete_market(&self, market_id: i64, user_id: &str) -> Result<Ack, FetchError> {
        let market = market_id.to_string();
        let url = self.url(&["api", "markets", &market]);
        self.send(Method::DELETE, url, Some(json!({ "user_id": user_id })))
            .await
    }

    pub async fn leave_market(&self, market_id: i64, user_id: &str) -> Result<Ack, FetchError> {
        let market = market_id.to_string();
        let url = self.url(&["api", "markets", &market, "members", user_id]);
        self.send(Method::DELETE, url, None).await
    }

    /// Creator only.
    pub async fn kick_member(
        &self,
        market_id: i64,
        member_id: &str,
        creator_id: &str,
    ) -> Result<Ack, FetchError> {
        let market = market_id.to_string();
        let url = self.url(&["api", "markets", &market, "members"]);
        let body = json!({ "user_to_kick_id": member_id, "creator_id": creator_id });
        self.send(Method::DELETE, url, Some(body)).await
    }

    /// List a player in a market, tradeable on one initial champion.
    pub async fn add_player(
        &self,
        market_id: i64,
        player_tag: &str,
        initial_champion: &str,
        user_id: &str,
    ) -> Result<Ack, FetchError> {
        let market = market_id.to_string();
        let url = self.url(&["api", "markets", &market, "players"]);
        let body = json!({
            "player_tag": player_tag,
            "user_id": user_id,
            "initial_champion": initial_champion,
        });
        self.send(Method::POST, url, Some(body)).await
    }

    pub async fn remove_player(&self, player_id: i64) -> Result<Ack, FetchError> {
        let player = player_id.to_string();
        let url = self.url(&["api", "markets", "players", &player]);
        self.send(Method::DELETE, url, None).await
    }

    pub async fn add_champion(&self, player_id: i64, champion: &str) -> Result<Ack, FetchError> {
        let player = player_id.to_string();
        let url = self.url(&["api", "markets", "players", &player, "champions"]);
        self.send(Method::POST, url, Some(json!({ "champion_name": champion })))
            .await
    }

    pub async fn remove_champion(
        &self,
        player_id: i64,
        champion: &str,
    ) -> Result<Ack, FetchError> {
        let player = player_id.to_string();
        let url = self.url(&["api", "markets", "players", &player, "champions", champion]);
        self.send(Method::DELETE, url, None).await
    }

    fn stock_url(
        &self,
        market_id: i64,
        player_tag: &str,
        champion: Option<&str>,
        resource: &str,
    ) -> Url {
        let market = market_id.to_string();
        let mut segments = vec!["api", "markets", market.as_str(), "stocks", player_tag];
        if let Some(champion) = champion {
            segments.push(champion);
        }
        segments.push(resource);
        self.url(&segments)
    }

    /// Base URL with `segments` appended, each percent-encoded as one path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// A mutation request. An empty response body decodes to `T::default()`.
    async fn send<T: DeserializeOwned + Default>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<T, FetchError> {
        debug!(method = %method, url = %url, "request");
        let mut request = self.client.request(method, url.clone());
        if let Some(body) = &body {
            request = request.json(body);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let body = read_body(resp, &url).await?;
        if body.trim().is_empty() {
            return Ok(T::default());
        }
        decode(&body)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let mut request = self.client.get(url.clone());
        if !query.is_empty() {
            request = request.query(query);
        }
        debug!(url = %url, "GET");

        let resp = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let body = read_body(resp, &url).await?;
        decode(&body)
    }
}

async fn read_body(resp: Response, url: &Url) -> Result<String, FetchError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            detail: error_detail(&body),
        });
    }
    Ok(body)
}

/// Decode a JSON response body.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))
}

/// Human-readable message from an error body such as `{"detail": "Market not found"}`.
pub fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
