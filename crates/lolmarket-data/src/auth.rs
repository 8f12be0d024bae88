//! Session identity.

use lolmarket_cache::ContextSource;
use lolmarket_core::traits::AuthProvider;
use lolmarket_core::types::DependencyContext;
use tokio::sync::watch;
use tracing::info;

/// Auth provider backed by a configured user id.
///
/// Sign-in and sign-out are driven by the caller; the session counts as resolved from
/// construction unless created with [`StaticAuth::unresolved`].
#[derive(Debug, Clone)]
pub struct StaticAuth {
    source: ContextSource,
}

impl StaticAuth {
    /// A resolved session, signed in when `user_id` is set.
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            source: ContextSource::ready(user_id),
        }
    }

    /// A session that has not been resolved yet.
    pub fn unresolved() -> Self {
        Self {
            source: ContextSource::pending(),
        }
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        info!(user = %user_id, "signed in");
        self.source.set_identity(user_id);
    }

    pub fn sign_out(&self) {
        info!("signed out");
        self.source.set_ready(None);
    }

    /// Signed-in user, if any.
    pub fn user_id(&self) -> Option<String> {
        self.source.current().identity
    }
}

impl AuthProvider for StaticAuth {
    fn current_identity(&self) -> DependencyContext {
        self.source.current()
    }

    fn watch(&self) -> watch::Receiver<DependencyContext> {
        self.source.subscribe()
    }

    fn name(&self) -> &str {
        "static"
    }
}
