//! Core types and traits for the lolmarket client.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Market, Stock, PricePoint, ModelScore)
//! - Dependency contexts that gate when data may be fetched
//! - The error taxonomy shared by the fetch client and the view cache
//! - Core traits for fetchers and auth providers

pub mod types;
pub mod traits;
pub mod error;

pub use error::{CacheError, FetchError, MarketError, MarketResult, PrefsError};
pub use types::*;
pub use traits::*;
