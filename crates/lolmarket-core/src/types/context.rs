//! Upstream readiness signals.

use serde::{Deserialize, Serialize};

/// Readiness and identity of an upstream context such as the signed-in user or the
/// selected market.
///
/// `ready` means the context has settled. A settled context may still have no identity
/// (signed out, or a user without markets).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependencyContext {
    pub ready: bool,
    pub identity: Option<String>,
}

impl DependencyContext {
    /// A context that has not settled yet.
    pub fn pending() -> Self {
        Self {
            ready: false,
            identity: None,
        }
    }

    /// A settled context.
    pub fn ready(identity: Option<String>) -> Self {
        Self {
            ready: true,
            identity,
        }
    }

    /// Settled with the given identity.
    pub fn with_identity(identity: impl Into<String>) -> Self {
        Self::ready(Some(identity.into()))
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_constructors() {
        assert!(!DependencyContext::pending().ready);
        assert_eq!(DependencyContext::default(), DependencyContext::pending());

        let ctx = DependencyContext::with_identity("user-a");
        assert!(ctx.ready);
        assert_eq!(ctx.identity(), Some("user-a"));

        let signed_out = DependencyContext::ready(None);
        assert!(signed_out.ready);
        assert_eq!(signed_out.identity(), None);
    }
}
