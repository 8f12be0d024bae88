//! Fetcher trait definitions.

use crate::error::FetchError;
use async_trait::async_trait;
use std::future::Future;

/// A single network call for one logical resource.
///
/// Implementations must be safe to call repeatedly; the view cache decides when and how
/// often `fetch` runs.
#[async_trait]
pub trait Fetcher<T>: Send + Sync {
    /// Fetch the resource.
    async fn fetch(&self) -> Result<T, FetchError>;
}

/// Fetcher backed by an async closure.
pub struct FetchFn<F>(F);

#[async_trait]
impl<T, F, Fut> Fetcher<T> for FetchFn<F>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
    async fn fetch(&self) -> Result<T, FetchError> {
        (self.0)().await
    }
}

/// Wrap an async closure as a [`Fetcher`].
pub fn fetch_fn<F>(f: F) -> FetchFn<F> {
    FetchFn(f)
}
