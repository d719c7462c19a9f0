//! Transition callback registry.
//!
//! View components register their enter/exit animation hooks here, keyed by
//! their instance key. The transition manager looks hooks up when it needs
//! them; a missing entry is a no-op, never a blocking wait. Entries are
//! removed explicitly when a transition collapses so stale callbacks cannot
//! leak, and the registry stops answering after `close()`.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::types::InstanceKey;

/// Animation hooks a mounted view component provides for its instance.
///
/// Each component registers exactly one pair per mount. The durations passed
/// in come from the manager's timing table; the manager does not trust the
/// hook's own timing and enforces the minimum wait itself.
#[async_trait]
pub trait ViewTransitionHooks: Send + Sync {
    /// Play the entrance animation.
    async fn on_transition_in(&self, duration: Duration);

    /// Play the exit animation.
    async fn on_transition_out(&self, duration: Duration);
}

/// Keyed map of per-instance transition hooks.
#[derive(Default)]
pub struct CallbackRegistry {
    hooks: Mutex<HashMap<InstanceKey, Arc<dyn ViewTransitionHooks>>>,
    closed: AtomicBool,
}

impl CallbackRegistry {
    /// Create a new registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register hooks for an instance key.
    ///
    /// Re-registering the same key replaces the previous entry with a warning;
    /// components are expected to register once per mount.
    pub fn register(&self, key: InstanceKey, hooks: Arc<dyn ViewTransitionHooks>) {
        if self.closed.load(Ordering::SeqCst) {
            tracing::debug!(key = %key, "ignoring registration after close");
            return;
        }
        if self.hooks.lock().insert(key.clone(), hooks).is_some() {
            tracing::warn!(key = %key, "transition hooks re-registered for key");
        }
    }

    /// Look up hooks for a key. `None` means "treat as immediately resolved".
    pub fn get(&self, key: &InstanceKey) -> Option<Arc<dyn ViewTransitionHooks>> {
        if self.closed.load(Ordering::SeqCst) {
            return None;
        }
        self.hooks.lock().get(key).cloned()
    }

    /// Remove the entry for a completed instance.
    pub fn remove(&self, key: &InstanceKey) {
        self.hooks.lock().remove(key);
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.hooks.lock().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.hooks.lock().is_empty()
    }

    /// Tear down: drop all entries and stop answering lookups.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.hooks.lock().clear();
    }
}
