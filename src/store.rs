//! Directive store: the explicit state container at the root of the app.
//!
//! Holds the single current directive, the immediately previous one (kept
//! only for narration inheritance), and the active theme. Mutations are
//! tagged with their origin so the URL sync controller can tell UI- and
//! LLM-driven changes apart from URL-driven ones and avoid feedback loops.
//!
//! Created with `new()` and torn down with `close()`; never a process-wide
//! singleton.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::types::{Directive, ThemeName};

/// Where a directive change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveOrigin {
    /// Emitted by the LLM tool call.
    Llm,
    /// Chosen through UI controls (menu, theme picker).
    Ui,
    /// Decoded from the URL (initial load or popstate).
    Url,
}

impl fmt::Display for DirectiveOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Llm => write!(f, "llm"),
            Self::Ui => write!(f, "ui"),
            Self::Url => write!(f, "url"),
        }
    }
}

/// Synchronous observer of directive changes.
pub type DirectiveSubscriber = Box<dyn Fn(&Directive, DirectiveOrigin) + Send + Sync>;

struct StoreInner {
    directive: Directive,
    last_directive: Option<Directive>,
    theme: ThemeName,
}

/// The application's directive/theme state container.
pub struct DirectiveStore {
    inner: Mutex<StoreInner>,
    subscribers: Mutex<Vec<DirectiveSubscriber>>,
    closed: AtomicBool,
}

impl DirectiveStore {
    /// Create a store idle on a landing directive with the given theme.
    pub fn new(theme: ThemeName) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(StoreInner {
                directive: Directive::landing(theme.clone()),
                last_directive: None,
                theme,
            }),
            subscribers: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// The current directive.
    pub fn directive(&self) -> Directive {
        self.inner.lock().directive.clone()
    }

    /// The previous directive, if any.
    pub fn last_directive(&self) -> Option<Directive> {
        self.inner.lock().last_directive.clone()
    }

    /// The active theme.
    pub fn active_theme(&self) -> ThemeName {
        self.inner.lock().theme.clone()
    }

    /// Narration to display: the current one, or the previous directive's
    /// when the current directive arrived without narration.
    pub fn display_narration(&self) -> String {
        let inner = self.inner.lock();
        if !inner.directive.narration().is_empty() {
            return inner.directive.narration().to_string();
        }
        inner
            .last_directive
            .as_ref()
            .map(|d| d.narration().to_string())
            .unwrap_or_default()
    }

    /// Replace the current directive, retaining the previous one.
    pub fn set_directive(&self, directive: Directive, origin: DirectiveOrigin) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        {
            let mut inner = self.inner.lock();
            let previous = std::mem::replace(&mut inner.directive, directive);
            inner.last_directive = Some(previous);
        }
        tracing::debug!(origin = %origin, "directive replaced");
        self.notify(origin);
    }

    /// Change the active theme and propagate it into the current directive so
    /// the directive stays the single source of truth for URL encoding.
    pub fn set_theme(&self, theme: ThemeName, origin: DirectiveOrigin) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        {
            let mut inner = self.inner.lock();
            if inner.theme == theme && inner.directive.theme() == Some(&theme) {
                return;
            }
            inner.theme = theme.clone();
            inner.directive.set_theme(theme);
        }
        self.notify(origin);
    }

    /// Register a synchronous change observer.
    pub fn subscribe(&self, subscriber: DirectiveSubscriber) {
        self.subscribers.lock().push(subscriber);
    }

    fn notify(&self, origin: DirectiveOrigin) {
        let directive = self.directive();
        for subscriber in self.subscribers.lock().iter() {
            subscriber(&directive, origin);
        }
    }

    /// Tear down: drop subscribers and refuse further mutation.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.subscribers.lock().clear();
    }
}
