//! Error types for the lolmarket client.

use crate::types::SubscriptionTier;
use thiserror::Error;

/// Top-level client error.
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Preference store error: {0}")]
    Prefs(#[from] PrefsError),

    #[error("Market not found: {0}")]
    MarketNotFound(i64),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Your {tier} plan allows {limit} market(s)")]
    MarketLimitReached {
        tier: SubscriptionTier,
        limit: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Errors produced while fetching a resource from the backend.
///
/// Cloned into every subscriber of a cache entry, so variants only carry owned strings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request to {url} failed with status {status}{}", detail_suffix(.detail))]
    Status {
        status: u16,
        url: String,
        detail: Option<String>,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Dependencies not ready")]
    DependencyNotReady,
}

impl FetchError {
    /// True for failures that happened before a response was received.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network(_))
    }

    /// The HTTP status for non-2xx responses.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// Misuse of the keyed cache store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache key {key} holds a value of a different type")]
    TypeMismatch { key: String },

    #[error("No fetcher registered for cache key {0}")]
    NoFetcher(String),
}

/// Persisted preference store errors.
#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for client operations.
pub type MarketResult<T> = Result<T, MarketError>;
