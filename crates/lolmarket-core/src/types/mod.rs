//! Core data types for the lolmarket client.

mod context;
mod history;
mod market;
mod stock;

pub use context::DependencyContext;
pub use history::{ModelScore, Period, PricePoint};
pub use market::{
    Ack, Market, MarketCreated, MarketDetails, MarketMember, PlayerInMarket, SubscriptionTier,
    UserProfile,
};
pub use stock::{Performer, Performers, Stock};
