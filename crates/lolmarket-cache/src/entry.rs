//! Cache entry snapshots.

use chrono::{DateTime, Utc};
use lolmarket_core::FetchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Lifecycle state of a cache entry.
///
/// ```text
/// Uninitialized -> Loading -> Ready | Failed
/// Ready -> Ready (refreshing) -> Ready
/// Failed -> Loading -> Ready
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CacheState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
    Failed,
}

impl CacheState {
    /// Whether a fetch for this entry has completed at least once.
    pub fn is_settled(&self) -> bool {
        matches!(self, CacheState::Ready | CacheState::Failed)
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CacheState::Uninitialized => "uninitialized",
            CacheState::Loading => "loading",
            CacheState::Ready => "ready",
            CacheState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Snapshot of one cache entry.
#[derive(Debug)]
pub struct CacheEntry<T> {
    /// Last good value, kept across failed refreshes.
    pub value: Option<Arc<T>>,
    /// When `value` was stored.
    pub fetched_at: Option<DateTime<Utc>>,
    pub state: CacheState,
    /// A background refresh is running while `value` is served.
    pub refreshing: bool,
    /// Error of the most recent fetch, cleared by the next success.
    pub error: Option<FetchError>,
}

impl<T> CacheEntry<T> {
    pub fn uninitialized() -> Self {
        Self {
            value: None,
            fetched_at: None,
            state: CacheState::Uninitialized,
            refreshing: false,
            error: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == CacheState::Ready
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            fetched_at: self.fetched_at,
            state: self.state,
            refreshing: self.refreshing,
            error: self.error.clone(),
        }
    }
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self::uninitialized()
    }
}
