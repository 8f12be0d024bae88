//! Core traits for the lolmarket client.

mod auth;
mod fetcher;

pub use auth::AuthProvider;
pub use fetcher::{fetch_fn, FetchFn, Fetcher};
