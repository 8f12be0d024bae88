//! View bindings: serve cached data to a view and keep it fresh.

use crate::entry::CacheState;
use crate::gate::{DependencyGate, GateState, Identity};
use crate::key::CacheKey;
use crate::store::{AnyValue, CacheStore, Refetch, Subscription};
use chrono::{DateTime, Utc};
use futures::future::{pending, BoxFuture};
use lolmarket_core::{FetchError, Fetcher};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Freshness options for a binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindOptions {
    /// Age after which a cached value is revalidated on mount.
    /// `None` revalidates on every mount.
    pub stale_after: Option<Duration>,
    /// Background refresh interval while the view is mounted.
    pub poll_interval: Option<Duration>,
}

impl BindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = Some(stale_after);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }
}

/// A cache key together with the fetcher that produces its value.
pub struct Bound<T> {
    key: CacheKey,
    fetcher: Arc<dyn Fetcher<T>>,
}

impl<T: Send + Sync + 'static> Bound<T> {
    pub fn new<F: Fetcher<T> + 'static>(key: CacheKey, fetcher: F) -> Self {
        Self {
            key,
            fetcher: Arc::new(fetcher),
        }
    }

    pub fn from_arc(key: CacheKey, fetcher: Arc<dyn Fetcher<T>>) -> Self {
        Self { key, fetcher }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    fn into_refetch(self) -> (CacheKey, Refetch) {
        let fetcher = self.fetcher;
        let refetch: Refetch =
            Arc::new(move || -> BoxFuture<'static, Result<AnyValue, FetchError>> {
                let fetcher = Arc::clone(&fetcher);
                Box::pin(async move {
                    fetcher
                        .fetch()
                        .await
                        .map(|value| Arc::new(value) as AnyValue)
                })
            });
        (self.key, refetch)
    }
}

impl<T> Clone for Bound<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl<T> fmt::Debug for Bound<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound").field("key", &self.key).finish()
    }
}

/// What a view renders.
#[derive(Debug)]
pub struct ViewState<T> {
    /// Key the view is bound to, if any.
    pub key: Option<CacheKey>,
    /// Last good value. Kept when a refresh fails.
    pub value: Option<Arc<T>>,
    /// No value yet and a first fetch is running.
    pub is_loading: bool,
    /// At least one fetch has completed for the bound key, or there is nothing to bind.
    pub is_initialized: bool,
    /// Serving `value` while a background refresh runs.
    pub is_refreshing: bool,
    /// Error of the most recent fetch.
    pub error: Option<FetchError>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> ViewState<T> {
    fn gated() -> Self {
        Self {
            key: None,
            value: None,
            is_loading: false,
            is_initialized: false,
            is_refreshing: false,
            error: None,
            fetched_at: None,
        }
    }

    fn unbound() -> Self {
        Self {
            is_initialized: true,
            ..Self::gated()
        }
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> Clone for ViewState<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            value: self.value.clone(),
            is_loading: self.is_loading,
            is_initialized: self.is_initialized,
            is_refreshing: self.is_refreshing,
            error: self.error.clone(),
            fetched_at: self.fetched_at,
        }
    }
}

enum Target {
    /// Dependencies not ready.
    Gated,
    /// Dependencies ready but the identity maps to no resource.
    Unbound,
    Mounted {
        key: CacheKey,
        refetch: Refetch,
        _subscription: Subscription,
    },
}

enum Rebind {
    Unchanged,
    Changed(Option<watch::Receiver<u64>>),
}

type Resolver<T> = Box<dyn Fn(&Identity) -> Option<Bound<T>> + Send + Sync>;

struct Shared<T> {
    store: CacheStore,
    resolver: Resolver<T>,
    options: BindOptions,
    target: Mutex<Target>,
}

impl<T> Shared<T> {
    fn target(&self) -> MutexGuard<'_, Target> {
        self.target
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Send + Sync + 'static> Shared<T> {
    /// Point the binding at the key for `gate`, fetching if needed.
    fn apply(&self, gate: &GateState) -> Rebind {
        let mut target = self.target();

        if !gate.ready {
            if !matches!(*target, Target::Gated) {
                debug!("dependencies no longer ready, view unbound");
            }
            *target = Target::Gated;
            return Rebind::Changed(None);
        }

        let Some(bound) = (self.resolver)(&gate.identity) else {
            *target = Target::Unbound;
            return Rebind::Changed(None);
        };

        if let Target::Mounted { key, .. } = &*target {
            if *key == bound.key {
                return Rebind::Unchanged;
            }
        }

        let (key, refetch) = bound.into_refetch();
        let subscription = self.store.subscribe(&key);
        let updates = subscription.updates();
        self.store
            .register_fetcher(&key, Arc::clone(&refetch), self.options.poll_interval);

        let fetching = self.store.needs_refresh(&key, self.options.stale_after)
            && self.store.launch(&key, Arc::clone(&refetch));
        debug!(key = %key, identity = %gate.identity, fetching, "view bound");

        *target = Target::Mounted {
            key,
            refetch,
            _subscription: subscription,
        };
        Rebind::Changed(Some(updates))
    }

    fn view(&self) -> ViewState<T> {
        let target = self.target();
        match &*target {
            Target::Gated => ViewState::gated(),
            Target::Unbound => ViewState::unbound(),
            Target::Mounted { key, .. } => {
                let entry = self.store.get::<T>(key);
                ViewState {
                    key: Some(key.clone()),
                    is_loading: entry.state == CacheState::Loading,
                    is_initialized: entry.state.is_settled(),
                    is_refreshing: entry.refreshing,
                    value: entry.value,
                    error: entry.error,
                    fetched_at: entry.fetched_at,
                }
            }
        }
    }

    fn refresh(&self) -> bool {
        match &*self.target() {
            Target::Mounted { key, refetch, .. } => self.store.launch(key, Arc::clone(refetch)),
            _ => false,
        }
    }

    fn key(&self) -> Option<CacheKey> {
        match &*self.target() {
            Target::Mounted { key, .. } => Some(key.clone()),
            _ => None,
        }
    }
}

/// A view's live connection to one cached resource.
///
/// The binding follows its [`DependencyGate`]: while the gate is not ready it exposes
/// an uninitialized view and never fetches; once ready it resolves the identity to a key,
/// serves whatever the store holds for that key and revalidates in the background.
/// Dropping the binding unsubscribes but does not cancel a running fetch.
pub struct ViewBinding<T> {
    shared: Arc<Shared<T>>,
    updates: watch::Receiver<u64>,
    driver: JoinHandle<()>,
}

impl<T: Send + Sync + 'static> ViewBinding<T> {
    /// Mount a binding. Must be called within a tokio runtime.
    ///
    /// `resolver` maps the gate identity to the resource to show; `None` means there is
    /// nothing to show for that identity (e.g. a user without markets).
    pub fn mount<R>(
        store: &CacheStore,
        mut gate: DependencyGate,
        resolver: R,
        options: BindOptions,
    ) -> Self
    where
        R: Fn(&Identity) -> Option<Bound<T>> + Send + Sync + 'static,
    {
        let shared = Arc::new(Shared {
            store: store.clone(),
            resolver: Box::new(resolver),
            options,
            target: Mutex::new(Target::Gated),
        });

        let entry_updates = match shared.apply(&gate.snapshot()) {
            Rebind::Changed(updates) => updates,
            Rebind::Unchanged => None,
        };
        let (tx, updates) = watch::channel(0);
        let driver = tokio::spawn(drive(Arc::clone(&shared), gate, entry_updates, tx));

        Self {
            shared,
            updates,
            driver,
        }
    }

    /// Mount a binding on a resource that does not depend on any context.
    pub fn mount_static(store: &CacheStore, bound: Bound<T>, options: BindOptions) -> Self {
        Self::mount(
            store,
            DependencyGate::always(),
            move |_| Some(bound.clone()),
            options,
        )
    }

    /// Current view.
    pub fn view(&self) -> ViewState<T> {
        self.shared.view()
    }

    /// Refetch now, ignoring staleness. Returns false if a fetch is already in flight
    /// or nothing is bound.
    pub fn refresh(&self) -> bool {
        self.shared.refresh()
    }

    /// Key currently bound.
    pub fn key(&self) -> Option<CacheKey> {
        self.shared.key()
    }

    /// Wait until the view may have changed. Returns false once the gate is gone.
    pub async fn changed(&mut self) -> bool {
        self.updates.changed().await.is_ok()
    }

    /// A receiver of view change notifications, for sharing the binding across tasks.
    pub fn updates(&self) -> watch::Receiver<u64> {
        let mut updates = self.updates.clone();
        updates.borrow_and_update();
        updates
    }

    /// Wait until the view is initialized and return it.
    ///
    /// Returns the current view early if the gate goes away.
    pub async fn initialized(&mut self) -> ViewState<T> {
        loop {
            let view = self.view();
            if view.is_initialized || !self.changed().await {
                return self.view();
            }
        }
    }

    /// Wait until neither a first load nor a refresh is running.
    pub async fn settled(&mut self) -> ViewState<T> {
        loop {
            let view = self.view();
            if (view.is_initialized && !view.is_refreshing) || !self.changed().await {
                return self.view();
            }
        }
    }
}

impl<T> Drop for ViewBinding<T> {
    fn drop(&mut self) {
        self.driver.abort();
        *self.shared.target() = Target::Gated;
    }
}

impl<T> fmt::Debug for ViewBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match &*self.shared.target() {
            Target::Mounted { key, .. } => Some(key.clone()),
            _ => None,
        };
        f.debug_struct("ViewBinding").field("key", &key).finish()
    }
}

async fn drive<T: Send + Sync + 'static>(
    shared: Arc<Shared<T>>,
    mut gate: DependencyGate,
    mut entry_updates: Option<watch::Receiver<u64>>,
    tx: watch::Sender<u64>,
) {
    loop {
        tokio::select! {
            alive = gate.changed() => {
                if !alive {
                    break;
                }
                if let Rebind::Changed(updates) = shared.apply(&gate.snapshot()) {
                    entry_updates = updates;
                }
            }
            _ = entry_changed(&mut entry_updates) => {}
        }
        tx.send_modify(|version| *version = version.wrapping_add(1));
    }
    debug!("dependency gate closed, view binding stopped");
}

async fn entry_changed(updates: &mut Option<watch::Receiver<u64>>) {
    match updates {
        Some(rx) => {
            if rx.changed().await.is_err() {
                pending::<()>().await;
            }
        }
        None => pending::<()>().await,
    }
}
