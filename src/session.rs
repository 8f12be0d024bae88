//! Client session: the view cache and its dependency contexts.

use anyhow::{bail, Context, Result};
use lolmarket_cache::{
    BindOptions, Bound, CacheStore, DependencyGate, Identity, Invalidator, ViewBinding,
    ViewState,
};
use lolmarket_config::AppConfig;
use lolmarket_core::error::MarketError;
use lolmarket_core::traits::AuthProvider;
use lolmarket_core::types::Market;
use lolmarket_data::market_context::USER_PART;
use lolmarket_data::{
    market_gate, market_id, ApiClient, ApiConfig, MarketActions, MarketContext, PreferenceStore,
    Resources, StaticAuth,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a command needs to show data.
pub struct Session {
    pub config: AppConfig,
    pub store: CacheStore,
    pub resources: Resources,
    pub auth: StaticAuth,
    pub markets: MarketContext,
    pub actions: MarketActions,
}

impl Session {
    /// Build the session. Must be called within a tokio runtime.
    pub fn start(config: AppConfig, user_override: Option<String>) -> Result<Self> {
        let client = ApiClient::new(ApiConfig::new(
            config.api.base_url.clone(),
            config.api.timeout(),
        ))
        .context("Failed to create API client")?;
        let resources = Resources::new(client.clone());

        let store = CacheStore::new();
        let prefs = PreferenceStore::open(&config.session.prefs_path).with_context(|| {
            format!(
                "Failed to open preferences at {}",
                config.session.prefs_path.display()
            )
        })?;

        let user = user_override.or_else(|| config.session.user_id.clone());
        info!(user = ?user, api = %config.api.base_url, "session started");
        let auth = StaticAuth::new(user);

        let options = bind_options(&config);
        let markets = MarketContext::start(
            &store,
            &auth,
            resources.clone(),
            Arc::new(prefs),
            options,
        );
        let actions = MarketActions::new(client, Invalidator::new(store.clone()));

        Ok(Self {
            config,
            store,
            resources,
            auth,
            markets,
            actions,
        })
    }

    /// Freshness options from the configuration.
    pub fn options(&self) -> BindOptions {
        bind_options(&self.config)
    }

    /// Signed-in user.
    pub fn user_id(&self) -> Result<String> {
        match self.auth.user_id() {
            Some(user) => Ok(user),
            None => Err(MarketError::NotSignedIn)
                .context("Pass --user or set session.user_id in the config"),
        }
    }

    /// Wait for the market selection and return the selected market.
    pub async fn market(&self) -> Result<Market> {
        self.user_id()?;
        self.markets.ready().await;
        if let Some(market) = self.markets.current_market() {
            return Ok(market);
        }

        let view = self.markets.markets();
        if let Some(error) = view.error {
            return Err(error).context("Failed to load your markets");
        }
        bail!("You are not a member of any market")
    }

    /// Bind a resource scoped to the selected market.
    pub fn bind_market<T, F>(&self, resolve: F, options: BindOptions) -> ViewBinding<T>
    where
        T: Send + Sync + 'static,
        F: Fn(&Resources, i64) -> Bound<T> + Send + Sync + 'static,
    {
        let resources = self.resources.clone();
        ViewBinding::mount(
            &self.store,
            market_gate(&self.auth, &self.markets),
            move |identity: &Identity| market_id(identity).map(|id| resolve(&resources, id)),
            options,
        )
    }

    /// Bind a resource scoped to the signed-in user.
    pub fn bind_user<T, F>(&self, resolve: F) -> ViewBinding<T>
    where
        T: Send + Sync + 'static,
        F: Fn(&Resources, &str) -> Bound<T> + Send + Sync + 'static,
    {
        let resources = self.resources.clone();
        ViewBinding::mount(
            &self.store,
            DependencyGate::new(vec![self.auth.watch()]),
            move |identity: &Identity| {
                identity
                    .part(USER_PART)
                    .map(|user| resolve(&resources, user))
            },
            self.options(),
        )
    }
}

fn bind_options(config: &AppConfig) -> BindOptions {
    BindOptions {
        stale_after: config.cache.stale_after(),
        poll_interval: config.cache.poll_interval(),
    }
}

/// Wait for a binding's first result.
///
/// A failed refresh with a previous value still returns that value, with a warning.
pub async fn load<T: Send + Sync + 'static>(binding: &mut ViewBinding<T>) -> Result<Arc<T>> {
    let view = binding.initialized().await;
    into_value(view)
}

pub fn into_value<T>(view: ViewState<T>) -> Result<Arc<T>> {
    match (view.value, view.error) {
        (Some(value), Some(error)) => {
            warn!(error = %error, "showing last known data");
            Ok(value)
        }
        (Some(value), None) => Ok(value),
        (None, Some(error)) => Err(error).context("Failed to load data"),
        (None, None) => bail!("No data available"),
    }
}
