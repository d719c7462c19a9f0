//! URL sync controller.
//!
//! Keeps the browser-style history and the directive store consistent in
//! both directions. Write-back observes store changes, encodes the directive
//! (theme guaranteed present), debounces, and navigates with a push when the
//! mode:variant key changed or a replace otherwise. Read-back decodes the
//! `state` parameter on back/forward and re-applies it to the store. Both
//! directions are guarded against feedback loops: URL-originated store
//! changes never trigger a re-encode.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::codec::{decode_state, encode_state, ensure_theme, to_store_directive, validate_directive};
use crate::store::{DirectiveOrigin, DirectiveStore};
use crate::types::{Directive, ThemeCatalog};

/// Debounce applied to URL write-backs.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Browser-style history holding the single `state` query parameter.
///
/// The URL is a global mutable resource; the controller is its only writer
/// on the write-back path, and reads it on popstate.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Current value of the `state` query parameter.
    async fn state_param(&self) -> Option<String>;

    /// Navigate, creating a new history entry.
    async fn push(&self, state: Option<String>);

    /// Navigate, replacing the current history entry.
    async fn replace(&self, state: Option<String>);
}

struct HistoryInner {
    entries: Vec<Option<String>>,
    index: usize,
}

/// In-memory history with a back/forward stack.
///
/// Backs tests and non-browser embeddings; `back()`/`forward()` move the
/// cursor the way browser navigation does, after which the embedder calls
/// the controller's popstate handler.
pub struct InMemoryHistory {
    inner: Mutex<HistoryInner>,
}

impl InMemoryHistory {
    /// Create a history with a single clean entry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(HistoryInner {
                entries: vec![None],
                index: 0,
            }),
        })
    }

    /// Current entry's state value.
    pub fn current(&self) -> Option<String> {
        let inner = self.inner.lock();
        inner.entries[inner.index].clone()
    }

    /// Number of entries in the stack.
    pub fn depth(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Go back one entry. Returns false at the start of the stack.
    pub fn back(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.index == 0 {
            return false;
        }
        inner.index -= 1;
        true
    }

    /// Go forward one entry. Returns false at the end of the stack.
    pub fn forward(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.index + 1 >= inner.entries.len() {
            return false;
        }
        inner.index += 1;
        true
    }
}

#[async_trait]
impl HistoryBackend for InMemoryHistory {
    async fn state_param(&self) -> Option<String> {
        self.current()
    }

    async fn push(&self, state: Option<String>) {
        let mut inner = self.inner.lock();
        let cut = inner.index + 1;
        inner.entries.truncate(cut);
        inner.entries.push(state);
        inner.index += 1;
    }

    async fn replace(&self, state: Option<String>) {
        let mut inner = self.inner.lock();
        let index = inner.index;
        inner.entries[index] = state;
    }
}

/// Push when the mode:variant navigation key changed, replace otherwise.
///
/// Pure so the history decision is testable independent of timers.
pub fn should_push(prev_nav_key: Option<&str>, next_nav_key: &str) -> bool {
    prev_nav_key != Some(next_nav_key)
}

/// Bidirectional URL <-> store synchronizer.
pub struct UrlSyncController {
    store: Arc<DirectiveStore>,
    history: Arc<dyn HistoryBackend>,
    themes: ThemeCatalog,
    debounce: Duration,
    applying_from_url: AtomicBool,
    last_nav_key: Mutex<Option<String>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl UrlSyncController {
    /// Create a controller with the default debounce.
    pub fn new(
        store: Arc<DirectiveStore>,
        history: Arc<dyn HistoryBackend>,
        themes: ThemeCatalog,
    ) -> Arc<Self> {
        Self::with_debounce(store, history, themes, DEFAULT_DEBOUNCE)
    }

    /// Create a controller with an explicit debounce.
    pub fn with_debounce(
        store: Arc<DirectiveStore>,
        history: Arc<dyn HistoryBackend>,
        themes: ThemeCatalog,
        debounce: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            history,
            themes,
            debounce,
            applying_from_url: AtomicBool::new(false),
            last_nav_key: Mutex::new(None),
            pending: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    /// Subscribe to the store so write-backs happen automatically.
    ///
    /// Must be called inside a tokio runtime: the debounce timer is spawned
    /// from the store's synchronous notification.
    pub fn attach(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.store.subscribe(Box::new(move |directive, origin| {
            if let Some(controller) = weak.upgrade() {
                controller.on_store_changed(directive.clone(), origin);
            }
        }));
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn on_store_changed(self: Arc<Self>, directive: Directive, origin: DirectiveOrigin) {
        if self.is_closed() {
            return;
        }
        if origin == DirectiveOrigin::Url || self.applying_from_url.load(Ordering::SeqCst) {
            tracing::debug!("change originated from URL; skipping write-back");
            return;
        }
        self.schedule_write(directive);
    }

    fn schedule_write(self: Arc<Self>, directive: Directive) {
        let debounce = self.debounce;
        let controller = Arc::clone(&self);
        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            controller.write_now(directive).await;
        }));
    }

    /// Encode a directive into the URL immediately (debounce already spent).
    ///
    /// On oversized state, retries once with narration cleared from the URL
    /// copy only; if still oversized the write is abandoned and the URL keeps
    /// its last valid state.
    pub async fn write_now(&self, mut directive: Directive) {
        if self.is_closed() {
            return;
        }
        ensure_theme(&mut directive, &self.store.active_theme());

        let encoded = match encode_state(&directive) {
            Ok(encoded) => encoded,
            Err(err) if err.is_too_large() => {
                tracing::warn!(%err, "state too large; retrying without narration");
                let mut stripped = directive.clone();
                stripped.set_narration("");
                match encode_state(&stripped) {
                    Ok(encoded) => encoded,
                    Err(err) => {
                        tracing::warn!(%err, "state still too large; abandoning URL write");
                        return;
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%err, "state encoding failed; abandoning URL write");
                return;
            }
        };

        if self.history.state_param().await.as_deref() == Some(encoded.as_str()) {
            tracing::debug!("URL already current; skipping navigation");
            return;
        }

        let nav_key = directive.nav_key();
        let push = {
            let mut last = self.last_nav_key.lock();
            let push = should_push(last.as_deref(), &nav_key);
            *last = Some(nav_key);
            push
        };

        if push {
            self.history.push(Some(encoded)).await;
        } else {
            self.history.replace(Some(encoded)).await;
        }
    }

    /// Apply the current URL state on startup.
    ///
    /// A malformed or invalid `state` parameter is stripped from the URL
    /// (history replace) and the store falls back to landing.
    pub async fn initialize_from_url(&self) {
        let Some(param) = self.history.state_param().await else {
            self.apply_from_url(Directive::landing(self.store.active_theme()));
            return;
        };

        match decode_state(&param).and_then(|value| validate_directive(value, &self.themes)) {
            Some(directive) => self.apply_from_url(self.bridge(directive)),
            None => {
                tracing::warn!("invalid state parameter at startup; cleaning URL");
                self.history.replace(None).await;
                self.apply_from_url(Directive::landing(self.store.active_theme()));
            }
        }
    }

    /// Re-apply URL state after browser back/forward.
    ///
    /// Absent parameter resets to a landing directive with the active theme;
    /// invalid state degrades the same way.
    pub async fn handle_popstate(&self) {
        if self.is_closed() {
            return;
        }
        let directive = match self.history.state_param().await {
            Some(param) => decode_state(&param)
                .and_then(|value| validate_directive(value, &self.themes))
                .map(|directive| self.bridge(directive))
                .unwrap_or_else(|| Directive::landing(self.store.active_theme())),
            None => Directive::landing(self.store.active_theme()),
        };
        self.apply_from_url(directive);
    }

    fn bridge(&self, mut directive: Directive) -> Directive {
        ensure_theme(&mut directive, &self.store.active_theme());
        to_store_directive(directive)
    }

    fn apply_from_url(&self, directive: Directive) {
        if let Some(theme) = directive.theme() {
            if *theme != self.store.active_theme() {
                self.store.set_theme(theme.clone(), DirectiveOrigin::Url);
            }
        }

        self.applying_from_url.store(true, Ordering::SeqCst);
        self.store.set_directive(directive, DirectiveOrigin::Url);
        self.applying_from_url.store(false, Ordering::SeqCst);

        // Keep the push-vs-replace key aligned with what the URL now shows.
        *self.last_nav_key.lock() = Some(self.store.directive().nav_key());
    }

    /// Tear down: abort any pending debounce timer and refuse further work.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(pending) = self.pending.lock().take() {
            pending.abort();
        }
    }
}
