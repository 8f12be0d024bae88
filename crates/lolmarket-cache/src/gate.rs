//! Dependency gating.
//!
//! Views that need the signed-in user or the selected market must not fetch until
//! those contexts have settled. A [`ContextSource`] publishes one context; a
//! [`DependencyGate`] composes several into a single ready flag and identity.

use futures::future::{pending, select_all};
use lolmarket_core::DependencyContext;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Publisher of one [`DependencyContext`].
#[derive(Clone)]
pub struct ContextSource {
    tx: Arc<watch::Sender<DependencyContext>>,
}

impl ContextSource {
    pub fn new(initial: DependencyContext) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// A source that has not settled yet.
    pub fn pending() -> Self {
        Self::new(DependencyContext::pending())
    }

    /// A settled source.
    pub fn ready(identity: Option<String>) -> Self {
        Self::new(DependencyContext::ready(identity))
    }

    /// Publish `ctx`. Subscribers are only woken if it differs from the current value.
    pub fn set(&self, ctx: DependencyContext) {
        self.tx.send_if_modified(|current| {
            if *current == ctx {
                false
            } else {
                *current = ctx;
                true
            }
        });
    }

    pub fn set_ready(&self, identity: Option<String>) {
        self.set(DependencyContext::ready(identity));
    }

    pub fn set_identity(&self, identity: impl Into<String>) {
        self.set(DependencyContext::with_identity(identity));
    }

    pub fn set_pending(&self) {
        self.set(DependencyContext::pending());
    }

    pub fn current(&self) -> DependencyContext {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DependencyContext> {
        self.tx.subscribe()
    }
}

impl fmt::Debug for ContextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContextSource").field(&self.current()).finish()
    }
}

/// Identities of a gate's inputs, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identity {
    parts: Vec<Option<String>>,
}

impl Identity {
    pub fn new(parts: Vec<Option<String>>) -> Self {
        Self { parts }
    }

    /// Identity of the input at `index`, if it has one.
    pub fn part(&self, index: usize) -> Option<&str> {
        self.parts.get(index).and_then(|part| part.as_deref())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Concatenated identity, used as a cache key fragment.
    pub fn as_key(&self) -> String {
        self.parts
            .iter()
            .map(|part| part.as_deref().unwrap_or(""))
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

/// Combined state of a gate's inputs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GateState {
    /// True iff every input is ready.
    pub ready: bool,
    pub identity: Identity,
}

/// Composition of several dependency contexts.
#[derive(Clone)]
pub struct DependencyGate {
    inputs: Vec<watch::Receiver<DependencyContext>>,
}

impl DependencyGate {
    pub fn new(inputs: Vec<watch::Receiver<DependencyContext>>) -> Self {
        Self { inputs }
    }

    pub fn from_sources(sources: &[&ContextSource]) -> Self {
        Self::new(sources.iter().map(|source| source.subscribe()).collect())
    }

    /// A gate with no inputs: always ready, empty identity.
    pub fn always() -> Self {
        Self::new(Vec::new())
    }

    /// Add another input after the existing ones.
    pub fn and(mut self, input: watch::Receiver<DependencyContext>) -> Self {
        self.inputs.push(input);
        self
    }

    /// State computed from the latest value of every input.
    pub fn current(&self) -> GateState {
        combine(self.inputs.iter().map(|rx| rx.borrow().clone()))
    }

    /// Like [`current`](Self::current), and marks every input as seen.
    pub fn snapshot(&mut self) -> GateState {
        combine(self.inputs.iter_mut().map(|rx| rx.borrow_and_update().clone()))
    }

    /// Wait until any input changes. Returns false once an input's source is gone.
    pub async fn changed(&mut self) -> bool {
        if self.inputs.is_empty() {
            return pending().await;
        }
        let (result, _, _) =
            select_all(self.inputs.iter_mut().map(|rx| Box::pin(rx.changed()))).await;
        result.is_ok()
    }
}

impl fmt::Debug for DependencyGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyGate")
            .field("state", &self.current())
            .finish()
    }
}

fn combine(contexts: impl Iterator<Item = DependencyContext>) -> GateState {
    let mut ready = true;
    let mut parts = Vec::new();
    for ctx in contexts {
        ready &= ctx.ready;
        parts.push(ctx.identity);
    }
    GateState {
        ready,
        identity: Identity::new(parts),
    }
}
