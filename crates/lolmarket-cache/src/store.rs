//! Keyed cache store.

use crate::entry::{CacheEntry, CacheState};
use crate::key::CacheKey;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use lolmarket_core::{CacheError, FetchError};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

pub(crate) type AnyValue = Arc<dyn Any + Send + Sync>;

/// Type-erased fetch registered for a key, used by invalidation and polling.
pub(crate) type Refetch =
    Arc<dyn Fn() -> BoxFuture<'static, Result<AnyValue, FetchError>> + Send + Sync>;

/// Right to run one fetch for a key, granted by [`CacheStore::mark_loading`].
///
/// The key stays in flight until the ticket is completed, failed or dropped.
/// Dropping an unfinished ticket (an aborted or panicked fetch task) frees the key
/// without touching its value.
pub struct FetchTicket {
    store: Weak<StoreInner>,
    key: CacheKey,
    seq: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Per-key sequence number; results are applied only in increasing order.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl Drop for FetchTicket {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            CacheStore { inner }.abandon(&self.key, self.seq);
        }
    }
}

impl fmt::Debug for FetchTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchTicket")
            .field("key", &self.key)
            .field("seq", &self.seq)
            .finish()
    }
}

struct Slot {
    value: Option<AnyValue>,
    fetched_at: Option<DateTime<Utc>>,
    fetched_instant: Option<Instant>,
    state: CacheState,
    error: Option<FetchError>,
    stale: bool,
    /// Sequence number of the fetch in flight.
    in_flight: Option<u64>,
    next_seq: u64,
    applied_seq: u64,
    subscribers: usize,
    refetch: Option<Refetch>,
    poller: Option<JoinHandle<()>>,
    notify: watch::Sender<u64>,
}

impl Slot {
    fn new() -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            value: None,
            fetched_at: None,
            fetched_instant: None,
            state: CacheState::Uninitialized,
            error: None,
            stale: false,
            in_flight: None,
            next_seq: 0,
            applied_seq: 0,
            subscribers: 0,
            refetch: None,
            poller: None,
            notify,
        }
    }

    fn release(&mut self, seq: u64) -> bool {
        if self.in_flight == Some(seq) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    fn store_value(&mut self, value: AnyValue) {
        self.value = Some(value);
        self.fetched_at = Some(Utc::now());
        self.fetched_instant = Some(Instant::now());
        self.state = CacheState::Ready;
        self.error = None;
        self.stale = false;
    }

    fn store_error(&mut self, error: FetchError) {
        // The last good value survives a failed refresh.
        self.state = if self.value.is_some() {
            CacheState::Ready
        } else {
            CacheState::Failed
        };
        self.error = Some(error);
    }

    fn notify(&self) {
        self.notify.send_modify(|version| *version = version.wrapping_add(1));
    }

    fn typed_value<T: Send + Sync + 'static>(
        &self,
        key: &CacheKey,
    ) -> Result<Option<Arc<T>>, CacheError> {
        match &self.value {
            Some(value) => Arc::clone(value)
                .downcast::<T>()
                .map(Some)
                .map_err(|_| CacheError::TypeMismatch {
                    key: key.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn snapshot<T>(&self, value: Option<Arc<T>>) -> CacheEntry<T> {
        CacheEntry {
            refreshing: self.value.is_some() && self.in_flight.is_some(),
            value,
            fetched_at: self.fetched_at,
            state: self.state,
            error: self.error.clone(),
        }
    }
}

struct StoreInner {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

/// Process-wide store of the last good value of every cached resource.
///
/// Cloning is cheap; clones share the same entries. All mutation goes through
/// `put`, `mark_loading`, `mark_failed` and ticket completion, each of which runs
/// in one short critical section, so `mark_loading` picks exactly one winner per key.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<StoreInner>,
}

impl CacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current entry for `key`, creating an uninitialized one if absent.
    ///
    /// A value stored under a different type is reported as absent.
    pub fn get<T: Send + Sync + 'static>(&self, key: &CacheKey) -> CacheEntry<T> {
        let mut slots = self.slots();
        let slot = slots.entry(key.clone()).or_insert_with(Slot::new);
        let value = slot.typed_value(key).unwrap_or_else(|err| {
            warn!(error = %err, "ignoring cached value");
            None
        });
        slot.snapshot(value)
    }

    /// Like [`get`](Self::get) but reports a type mismatch.
    pub fn try_get<T: Send + Sync + 'static>(
        &self,
        key: &CacheKey,
    ) -> Result<CacheEntry<T>, CacheError> {
        let mut slots = self.slots();
        let slot = slots.entry(key.clone()).or_insert_with(Slot::new);
        let value = slot.typed_value(key)?;
        Ok(slot.snapshot(value))
    }

    /// Store a value directly and notify subscribers.
    ///
    /// Fetches started before the put can no longer overwrite it.
    pub fn put<T: Send + Sync + 'static>(&self, key: &CacheKey, value: T) {
        let mut slots = self.slots();
        let slot = slots.entry(key.clone()).or_insert_with(Slot::new);
        slot.next_seq += 1;
        slot.applied_seq = slot.next_seq;
        slot.store_value(Arc::new(value));
        slot.notify();
        debug!(key = %key, "cache put");
    }

    /// Claim the right to fetch `key`.
    ///
    /// Returns `None` while another ticket for the key is outstanding.
    pub fn mark_loading(&self, key: &CacheKey) -> Option<FetchTicket> {
        let mut slots = self.slots();
        let slot = slots.entry(key.clone()).or_insert_with(Slot::new);

        if slot.in_flight.is_some() {
            debug!(key = %key, "fetch already in flight");
            return None;
        }

        slot.next_seq += 1;
        let seq = slot.next_seq;
        slot.in_flight = Some(seq);
        if slot.value.is_none() {
            slot.state = CacheState::Loading;
        }
        slot.notify();
        debug!(key = %key, seq, "fetch started");

        Some(FetchTicket {
            store: Arc::downgrade(&self.inner),
            key: key.clone(),
            seq,
        })
    }

    /// Free the key held by a ticket that ends without a result.
    fn abandon(&self, key: &CacheKey, seq: u64) {
        let mut slots = self.slots();
        let Some(slot) = slots.get_mut(key) else {
            return;
        };
        if !slot.release(seq) {
            return;
        }
        if slot.state == CacheState::Loading {
            slot.state = if slot.error.is_some() {
                CacheState::Failed
            } else {
                CacheState::Uninitialized
            };
        }
        slot.notify();
        debug!(key = %key, seq, "fetch abandoned");
    }

    /// Record a failure for `key` without a ticket. Keeps the last good value.
    pub fn mark_failed(&self, key: &CacheKey, error: FetchError) {
        let mut slots = self.slots();
        let slot = slots.entry(key.clone()).or_insert_with(Slot::new);
        warn!(key = %key, error = %error, "fetch failed");
        slot.store_error(error);
        slot.notify();
    }

    /// Apply a successful fetch. Returns false if a newer result was already applied.
    pub fn complete<T: Send + Sync + 'static>(&self, ticket: FetchTicket, value: T) -> bool {
        self.apply(ticket, Ok(Arc::new(value)))
    }

    /// Apply a failed fetch. Returns false if a newer result was already applied.
    pub fn fail(&self, ticket: FetchTicket, error: FetchError) -> bool {
        self.apply(ticket, Err(error))
    }

    /// The ticket is released here; its drop afterwards is a no-op.
    fn apply(&self, ticket: FetchTicket, outcome: Result<AnyValue, FetchError>) -> bool {
        let mut slots = self.slots();
        let Some(slot) = slots.get_mut(&ticket.key) else {
            return false;
        };

        slot.release(ticket.seq);
        if ticket.seq <= slot.applied_seq {
            debug!(
                key = %ticket.key,
                seq = ticket.seq,
                applied = slot.applied_seq,
                "discarding out-of-order fetch result"
            );
            slot.notify();
            return false;
        }

        slot.applied_seq = ticket.seq;
        match outcome {
            Ok(value) => {
                debug!(key = %ticket.key, seq = ticket.seq, "fetch completed");
                slot.store_value(value);
            }
            Err(error) => {
                warn!(key = %ticket.key, error = %error, "fetch failed");
                slot.store_error(error);
            }
        }
        slot.notify();
        true
    }

    /// Run `refetch` for `key` in the background if no fetch is in flight.
    pub(crate) fn launch(&self, key: &CacheKey, refetch: Refetch) -> bool {
        let Some(ticket) = self.mark_loading(key) else {
            return false;
        };
        let store = self.clone();
        tokio::spawn(async move {
            let outcome = refetch().await;
            store.apply(ticket, outcome);
        });
        true
    }

    /// Refetch `key` with the fetcher its bindings registered.
    pub fn refetch(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let refetch = self
            .slots()
            .get(key)
            .and_then(|slot| slot.refetch.clone())
            .ok_or_else(|| CacheError::NoFetcher(key.to_string()))?;
        Ok(self.launch(key, refetch))
    }

    /// Whether a binding mounting on `key` should refresh it.
    ///
    /// `stale_after = None` always revalidates.
    pub fn needs_refresh(&self, key: &CacheKey, stale_after: Option<Duration>) -> bool {
        let mut slots = self.slots();
        let slot = slots.entry(key.clone()).or_insert_with(Slot::new);
        if slot.stale || slot.value.is_none() {
            return true;
        }
        match (stale_after, slot.fetched_instant) {
            (Some(max_age), Some(fetched)) => fetched.elapsed() >= max_age,
            _ => true,
        }
    }

    /// Subscribe to updates of `key`.
    pub fn subscribe(&self, key: &CacheKey) -> Subscription {
        let mut slots = self.slots();
        let slot = slots.entry(key.clone()).or_insert_with(Slot::new);
        slot.subscribers += 1;
        Subscription {
            store: self.clone(),
            key: key.clone(),
            updates: slot.notify.subscribe(),
        }
    }

    fn unsubscribe(&self, key: &CacheKey) {
        let mut slots = self.slots();
        if let Some(slot) = slots.get_mut(key) {
            slot.subscribers = slot.subscribers.saturating_sub(1);
            if slot.subscribers == 0 {
                if let Some(poller) = slot.poller.take() {
                    poller.abort();
                    debug!(key = %key, "last subscriber left, polling stopped");
                }
            }
        }
    }

    /// Number of live subscriptions on `key`.
    pub fn subscriber_count(&self, key: &CacheKey) -> usize {
        self.slots().get(key).map_or(0, |slot| slot.subscribers)
    }

    /// Whether `key` is polled in the background.
    pub fn is_polling(&self, key: &CacheKey) -> bool {
        self.slots()
            .get(key)
            .map_or(false, |slot| slot.poller.is_some())
    }

    /// Register the fetch used to refresh `key` on invalidation, and start polling
    /// it if requested and someone is subscribed.
    pub(crate) fn register_fetcher(
        &self,
        key: &CacheKey,
        refetch: Refetch,
        poll_interval: Option<Duration>,
    ) {
        let mut slots = self.slots();
        let slot = slots.entry(key.clone()).or_insert_with(Slot::new);
        slot.refetch = Some(refetch);

        if let Some(interval) = poll_interval {
            if slot.poller.is_none() && slot.subscribers > 0 && !interval.is_zero() {
                slot.poller = Some(self.spawn_poller(key.clone(), interval));
                debug!(key = %key, interval_ms = interval.as_millis() as u64, "polling started");
            }
        }
    }

    fn spawn_poller(&self, key: CacheKey, interval: Duration) -> JoinHandle<()> {
        let store: Weak<StoreInner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the mount already fetched.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = store.upgrade() else {
                    break;
                };
                CacheStore { inner }.invalidate(std::slice::from_ref(&key));
            }
        })
    }

    /// Receiver that changes whenever the entry for `key` changes.
    pub fn watch(&self, key: &CacheKey) -> watch::Receiver<u64> {
        let mut slots = self.slots();
        slots
            .entry(key.clone())
            .or_insert_with(Slot::new)
            .notify
            .subscribe()
    }

    /// Force a refetch of each key.
    ///
    /// Keys with a fetch in flight are left alone. Keys nobody is subscribed to are
    /// marked stale so the next binding refetches them. Returns the number of fetches
    /// started.
    pub fn invalidate(&self, keys: &[CacheKey]) -> usize {
        let mut started = 0;
        for key in keys {
            let refetch = {
                let mut slots = self.slots();
                let Some(slot) = slots.get_mut(key) else {
                    continue;
                };
                if slot.in_flight.is_some() {
                    debug!(key = %key, "invalidate: fetch already in flight");
                    continue;
                }
                if slot.subscribers == 0 || slot.refetch.is_none() {
                    slot.stale = true;
                    debug!(key = %key, "invalidate: marked stale");
                    continue;
                }
                slot.refetch.clone()
            };
            if let Some(refetch) = refetch {
                if self.launch(key, refetch) {
                    started += 1;
                }
            }
        }
        started
    }

    /// Every key currently held, sorted.
    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self.slots().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Keys starting with `prefix`, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self
            .slots()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.len())
            .finish()
    }
}

/// A view's interest in one key. Dropping it unsubscribes.
pub struct Subscription {
    store: CacheStore,
    key: CacheKey,
    updates: watch::Receiver<u64>,
}

impl Subscription {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Wait for the next change of the entry.
    pub async fn changed(&mut self) -> bool {
        self.updates.changed().await.is_ok()
    }

    /// A receiver that has seen every change up to the moment of subscribing.
    pub(crate) fn updates(&self) -> watch::Receiver<u64> {
        self.updates.clone()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.store.unsubscribe(&self.key);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key() -> CacheKey {
        CacheKey::market_stocks(1)
    }

    #[test]
    fn test_get_creates_uninitialized_entry() {
        let store = CacheStore::default();
        let entry = store.get::<Vec<u32>>(&key());
        assert_eq!(entry.state, CacheState::Uninitialized);
        assert!(entry.value.is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_put_makes_entry_ready() {
        let store = CacheStore::default();
        store.put(&key(), vec![1u32, 2]);

        let entry = store.get::<Vec<u32>>(&key());
        assert_eq!(entry.state, CacheState::Ready);
        assert_eq!(entry.value.as_deref(), Some(&vec![1, 2]));
        assert!(entry.fetched_at.is_some());
        assert!(!entry.refreshing);
    }

    #[tokio::test]
    async fn test_mark_loading_single_winner() {
        let store = CacheStore::default();
        let first = store.mark_loading(&key());
        let second = store.mark_loading(&key());
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(store.get::<u32>(&key()).state, CacheState::Loading);

        store.complete(first.unwrap(), 5u32);
        assert!(store.mark_loading(&key()).is_some());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_value() {
        let store = CacheStore::default();
        store.put(&key(), 10u32);

        let ticket = store.mark_loading(&key()).unwrap();
        assert!(store.get::<u32>(&key()).refreshing);
        store.fail(ticket, FetchError::Network("timeout".into()));

        let entry = store.get::<u32>(&key());
        assert_eq!(entry.state, CacheState::Ready);
        assert_eq!(entry.value.as_deref(), Some(&10));
        assert_eq!(entry.error, Some(FetchError::Network("timeout".into())));
        assert!(!entry.refreshing);
    }

    #[tokio::test]
    async fn test_failure_without_value_is_failed_then_recovers() {
        let store = CacheStore::default();
        let ticket = store.mark_loading(&key()).unwrap();
        store.fail(ticket, FetchError::Decode("bad".into()));
        assert_eq!(store.get::<u32>(&key()).state, CacheState::Failed);

        let retry = store.mark_loading(&key()).unwrap();
        assert_eq!(store.get::<u32>(&key()).state, CacheState::Loading);
        store.complete(retry, 3u32);

        let entry = store.get::<u32>(&key());
        assert_eq!(entry.state, CacheState::Ready);
        assert!(entry.error.is_none());
    }

    #[tokio::test]
    async fn test_mark_failed_direct_keeps_value() {
        let store = CacheStore::default();
        store.put(&key(), "v1".to_string());
        store.mark_failed(&key(), FetchError::Network("offline".into()));

        let entry = store.get::<String>(&key());
        assert_eq!(entry.value.as_deref().map(String::as_str), Some("v1"));
        assert!(entry.error.is_some());
    }

    #[tokio::test]
    async fn test_dropped_ticket_frees_key() {
        let store = CacheStore::default();
        let ticket = store.mark_loading(&key()).unwrap();
        assert_eq!(store.get::<u32>(&key()).state, CacheState::Loading);

        drop(ticket);
        assert_eq!(store.get::<u32>(&key()).state, CacheState::Uninitialized);
        assert!(store.mark_loading(&key()).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_stays_in_flight_until_done() {
        let store = CacheStore::default();
        let refetch: Refetch = Arc::new(|| -> BoxFuture<'static, Result<AnyValue, FetchError>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(600)).await;
                Ok(Arc::new(1u32) as AnyValue)
            })
        });

        assert!(store.launch(&key(), Arc::clone(&refetch)));
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(store.mark_loading(&key()).is_none());
        assert!(!store.launch(&key(), refetch));

        let mut updates = store.watch(&key());
        while store.get::<u32>(&key()).state != CacheState::Ready {
            updates.changed().await.unwrap();
        }
        assert!(store.mark_loading(&key()).is_some());
    }

    #[tokio::test]
    async fn test_result_started_before_put_is_discarded() {
        let store = CacheStore::default();
        let ticket = store.mark_loading(&key()).unwrap();
        store.put(&key(), 2u32);
        assert!(!store.complete(ticket, 1u32));
        assert_eq!(store.get::<u32>(&key()).value.as_deref(), Some(&2));
        // The discarded result still freed the key.
        assert!(store.mark_loading(&key()).is_some());
    }

    #[tokio::test]
    async fn test_type_mismatch() {
        let store = CacheStore::default();
        store.put(&key(), 1u32);
        assert!(store.get::<String>(&key()).value.is_none());
        assert_eq!(
            store.try_get::<String>(&key()).unwrap_err(),
            CacheError::TypeMismatch {
                key: "market:1:stocks".into()
            }
        );
    }

    #[tokio::test]
    async fn test_subscription_notified_and_counted() {
        let store = CacheStore::default();
        let mut sub = store.subscribe(&key());
        assert_eq!(store.subscriber_count(&key()), 1);

        store.put(&key(), 1u32);
        assert!(sub.changed().await);

        drop(sub);
        assert_eq!(store.subscriber_count(&key()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_needs_refresh_respects_stale_after() {
        let store = CacheStore::default();
        assert!(store.needs_refresh(&key(), Some(Duration::from_secs(60))));

        store.put(&key(), 1u32);
        assert!(!store.needs_refresh(&key(), Some(Duration::from_secs(60))));
        assert!(store.needs_refresh(&key(), None));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(store.needs_refresh(&key(), Some(Duration::from_secs(60))));
    }

    #[tokio::test]
    async fn test_invalidate_unsubscribed_marks_stale() {
        let store = CacheStore::default();
        store.put(&key(), 1u32);
        assert!(!store.needs_refresh(&key(), Some(Duration::from_secs(60))));

        assert_eq!(store.invalidate(&[key()]), 0);
        assert!(store.needs_refresh(&key(), Some(Duration::from_secs(60))));
    }

    #[tokio::test]
    async fn test_refetch_without_fetcher() {
        let store = CacheStore::default();
        assert_eq!(
            store.refetch(&key()).unwrap_err(),
            CacheError::NoFetcher("market:1:stocks".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_runs_while_subscribed() {
        let store = CacheStore::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let refetch: Refetch = Arc::new(move || -> BoxFuture<'static, Result<AnyValue, FetchError>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(Arc::new(1u32) as AnyValue) })
        });

        let sub = store.subscribe(&key());
        store.register_fetcher(&key(), refetch, Some(Duration::from_secs(10)));
        assert!(store.is_polling(&key()));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        drop(sub);
        assert!(!store.is_polling(&key()));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
