//! Backend access for the lolmarket client.
//!
//! - [`ApiClient`]: typed calls to the market backend
//! - [`Resources`]: backend resources paired with their cache keys
//! - [`StaticAuth`]: signed-in user as a dependency context
//! - [`PreferenceStore`]: persisted UI preferences
//! - [`MarketContext`]: the selected market as a dependency context
//! - [`MarketActions`]: market mutations and the cache keys they invalidate

pub mod actions;
pub mod auth;
pub mod client;
pub mod market_context;
pub mod prefs;
pub mod resources;

pub use actions::{check_market_limit, MarketActions};
pub use auth::StaticAuth;
pub use client::{ApiClient, ApiConfig};
pub use market_context::{choose_market, market_gate, market_id, MarketContext};
pub use prefs::{PreferenceStore, LAST_SELECTED_MARKET};
pub use resources::Resources;
