//! Explicit invalidation after mutations.

use crate::key::CacheKey;
use crate::store::CacheStore;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// Forces refetches of cached resources after a mutation.
#[derive(Debug, Clone)]
pub struct Invalidator {
    store: CacheStore,
}

impl Invalidator {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    /// Refetch `keys` now. Returns the number of fetches started.
    pub fn invalidate(&self, keys: &[CacheKey]) -> usize {
        let started = self.store.invalidate(keys);
        info!(keys = keys.len(), started, "cache invalidated");
        started
    }

    /// Refetch `keys` once `delay` has elapsed, for mutations the server applies
    /// asynchronously.
    pub fn invalidate_after(&self, keys: Vec<CacheKey>, delay: Duration) -> JoinHandle<usize> {
        let invalidator = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            invalidator.invalidate(&keys)
        })
    }

    /// Refetch every cached key that starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let keys = self.store.keys_with_prefix(prefix);
        self.invalidate(&keys)
    }

    /// [`invalidate_prefix`](Self::invalidate_prefix) once `delay` has elapsed. Keys are
    /// matched when the delay ends.
    pub fn invalidate_prefix_after(&self, prefix: String, delay: Duration) -> JoinHandle<usize> {
        let invalidator = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            invalidator.invalidate_prefix(&prefix)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{BindOptions, Bound, ViewBinding};
    use lolmarket_core::{fetch_fn, FetchError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_binding(
        store: &CacheStore,
        key: CacheKey,
        calls: &Arc<AtomicUsize>,
    ) -> ViewBinding<usize> {
        let calls = Arc::clone(calls);
        let bound = Bound::new(
            key,
            fetch_fn(move || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok::<_, FetchError>(n) }
            }),
        );
        ViewBinding::mount_static(store, bound, BindOptions::default())
    }

    #[tokio::test]
    async fn test_invalidate_refetches_bound_key() {
        let store = CacheStore::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut binding = counting_binding(&store, CacheKey::market_stocks(1), &calls);
        binding.settled().await;

        let invalidator = Invalidator::new(store.clone());
        assert_eq!(invalidator.invalidate(&[CacheKey::market_stocks(1)]), 1);

        let view = binding.settled().await;
        assert_eq!(view.value.as_deref(), Some(&2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_prefix_only_touches_matching_keys() {
        let store = CacheStore::default();
        let calls_a = Arc::new(AtomicUsize::new(0));
        let calls_b = Arc::new(AtomicUsize::new(0));
        let mut a = counting_binding(&store, CacheKey::market_stocks(1), &calls_a);
        let mut b = counting_binding(&store, CacheKey::market_stocks(2), &calls_b);
        a.settled().await;
        b.settled().await;

        let started = Invalidator::new(store.clone()).invalidate_prefix(&CacheKey::market_prefix(1));
        assert_eq!(started, 1);
        a.settled().await;
        assert_eq!(calls_a.load(Ordering::SeqCst), 2);
        assert_eq!(calls_b.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_lets_in_flight_fetch_finish() {
        let store = CacheStore::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let bound = Bound::new(
            CacheKey::market_stocks(1),
            fetch_fn(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok::<_, FetchError>(n)
                }
            }),
        );
        let mut binding = ViewBinding::mount_static(&store, bound, BindOptions::default());
        assert!(binding.view().is_loading);

        let invalidator = Invalidator::new(store.clone());
        assert_eq!(invalidator.invalidate(&[CacheKey::market_stocks(1)]), 0);

        let view = binding.settled().await;
        assert_eq!(view.value.as_deref(), Some(&1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_after_waits_for_delay() {
        let store = CacheStore::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut binding = counting_binding(&store, CacheKey::market_stocks(1), &calls);
        binding.settled().await;

        let handle = Invalidator::new(store.clone())
            .invalidate_after(vec![CacheKey::market_stocks(1)], Duration::from_millis(2000));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(handle.await.unwrap(), 1);
        binding.settled().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
