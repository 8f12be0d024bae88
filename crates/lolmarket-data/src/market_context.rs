//! Selected market context.
//!
//! Market-scoped views depend on two contexts: the signed-in user and the market the
//! user is looking at. [`MarketContext`] derives the second from the first. It binds the
//! user's market list and, once that list is loaded, publishes the selected market id
//! as a [`DependencyContext`] identity.

use crate::prefs::PreferenceStore;
use crate::resources::Resources;
use lolmarket_cache::{
    BindOptions, CacheStore, ContextSource, DependencyGate, Identity, ViewBinding, ViewState,
};
use lolmarket_core::error::{MarketError, MarketResult};
use lolmarket_core::traits::AuthProvider;
use lolmarket_core::types::{DependencyContext, Market};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Index of the user id in a [`market_gate`] identity.
pub const USER_PART: usize = 0;
/// Index of the market id in a [`market_gate`] identity.
pub const MARKET_PART: usize = 1;

/// The market the user is currently viewing.
pub struct MarketContext {
    source: ContextSource,
    markets: Arc<ViewBinding<Vec<Market>>>,
    prefs: Arc<PreferenceStore>,
    reconciler: JoinHandle<()>,
}

impl MarketContext {
    /// Bind the user's markets and start tracking the selection.
    pub fn start(
        store: &CacheStore,
        auth: &dyn AuthProvider,
        resources: Resources,
        prefs: Arc<PreferenceStore>,
        options: BindOptions,
    ) -> Self {
        let source = ContextSource::pending();
        let markets = Arc::new(ViewBinding::mount(
            store,
            DependencyGate::new(vec![auth.watch()]),
            move |identity: &Identity| {
                identity
                    .part(USER_PART)
                    .map(|user| resources.user_markets(user))
            },
            options,
        ));

        let reconciler = {
            let source = source.clone();
            let markets = Arc::clone(&markets);
            let prefs = Arc::clone(&prefs);
            let mut updates = markets.updates();
            tokio::spawn(async move {
                loop {
                    reconcile(&source, &markets.view(), &prefs);
                    if updates.changed().await.is_err() {
                        break;
                    }
                }
            })
        };
        reconcile(&source, &markets.view(), &prefs);

        Self {
            source,
            markets,
            prefs,
            reconciler,
        }
    }

    /// Select `market_id` and remember it for the next session.
    pub fn select(&self, market_id: i64) -> MarketResult<Market> {
        let view = self.markets.view();
        let markets = view.value.ok_or(MarketError::MarketNotFound(market_id))?;
        let market = markets
            .iter()
            .find(|market| market.id == market_id)
            .cloned()
            .ok_or(MarketError::MarketNotFound(market_id))?;

        self.prefs.set_last_selected_market(market_id)?;
        self.source.set_identity(market_id.to_string());
        info!(market = market_id, name = %market.name, "market selected");
        Ok(market)
    }

    /// Id of the selected market.
    pub fn selected_id(&self) -> Option<i64> {
        self.source
            .current()
            .identity()
            .and_then(|id| id.parse().ok())
    }

    /// The selected market, if the market list has it.
    pub fn current_market(&self) -> Option<Market> {
        let id = self.selected_id()?;
        let markets = self.markets.view().value?;
        markets.iter().find(|market| market.id == id).cloned()
    }

    /// The user's market list.
    pub fn markets(&self) -> ViewState<Vec<Market>> {
        self.markets.view()
    }

    /// Refetch the market list.
    pub fn refresh_markets(&self) -> bool {
        self.markets.refresh()
    }

    pub fn current(&self) -> DependencyContext {
        self.source.current()
    }

    /// Change notifications of the selection.
    pub fn watch(&self) -> watch::Receiver<DependencyContext> {
        self.source.subscribe()
    }

    /// Wait for a market list refresh to finish, then return the selection it produced.
    pub async fn settled(&self) -> DependencyContext {
        let mut updates = self.markets.updates();
        loop {
            let view = self.markets.view();
            if (view.is_initialized && !view.is_refreshing) || updates.changed().await.is_err() {
                break;
            }
        }
        reconcile(&self.source, &self.markets.view(), &self.prefs);
        self.ready().await
    }

    /// Wait until the selection has settled.
    pub async fn ready(&self) -> DependencyContext {
        let mut rx = self.watch();
        loop {
            let ctx = rx.borrow_and_update().clone();
            if ctx.ready || rx.changed().await.is_err() {
                return ctx;
            }
        }
    }
}

impl Drop for MarketContext {
    fn drop(&mut self) {
        self.reconciler.abort();
    }
}

/// Gate over the signed-in user and the selected market, in that order.
pub fn market_gate(auth: &dyn AuthProvider, market: &MarketContext) -> DependencyGate {
    DependencyGate::new(vec![auth.watch(), market.watch()])
}

/// Market id of a [`market_gate`] identity.
pub fn market_id(identity: &Identity) -> Option<i64> {
    identity.part(MARKET_PART)?.parse().ok()
}

/// Market to select from `markets`: the preferred one if the user still belongs to it,
/// otherwise the first.
pub fn choose_market(markets: &[Market], preferred: Option<i64>) -> Option<i64> {
    preferred
        .filter(|id| markets.iter().any(|market| market.id == *id))
        .or_else(|| markets.first().map(|market| market.id))
}

fn reconcile(source: &ContextSource, view: &ViewState<Vec<Market>>, prefs: &PreferenceStore) {
    if !view.is_initialized {
        // Hold market views until the current user's list arrives.
        source.set_pending();
        return;
    }

    let Some(markets) = &view.value else {
        if let Some(error) = &view.error {
            warn!(error = %error, "market list unavailable");
        }
        source.set_ready(None);
        return;
    };

    let current = source.current();
    let kept = current
        .identity()
        .and_then(|id| id.parse::<i64>().ok())
        .filter(|id| markets.iter().any(|market| market.id == *id));
    let selected = kept.or_else(|| choose_market(markets, prefs.last_selected_market()));

    let next = DependencyContext::ready(selected.map(|id| id.to_string()));
    if next != current {
        debug!(market = ?selected, "market selection resolved");
    }
    source.set(next);
}
