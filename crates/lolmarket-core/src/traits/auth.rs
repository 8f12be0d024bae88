//! Auth provider trait.

use crate::types::DependencyContext;
use tokio::sync::watch;

/// Source of the signed-in identity.
///
/// The identity is the user id; `ready` turns true once the session has been resolved,
/// whether or not someone is signed in.
pub trait AuthProvider: Send + Sync {
    /// Current session state.
    fn current_identity(&self) -> DependencyContext;

    /// Change notifications for sign-in and sign-out.
    fn watch(&self) -> watch::Receiver<DependencyContext>;

    /// Name of the provider, for logging.
    fn name(&self) -> &str;
}
