//! Stale-while-revalidate view data cache.
//!
//! A [`CacheStore`] holds the last good value of every resource the client has fetched.
//! [`ViewBinding`]s serve that value to views immediately and refresh it in the
//! background once their [`DependencyGate`] is ready. The [`Invalidator`] forces refreshes
//! after user actions.

mod binding;
mod entry;
mod gate;
mod invalidate;
mod key;
mod store;

pub use binding::{BindOptions, Bound, ViewBinding, ViewState};
pub use entry::{CacheEntry, CacheState};
pub use gate::{ContextSource, DependencyGate, GateState, Identity};
pub use invalidate::Invalidator;
pub use key::CacheKey;
pub use store::{CacheStore, FetchTicket, Subscription};
