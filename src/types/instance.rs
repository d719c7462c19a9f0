//! View instance and transition state types.
//!
//! A view instance is one mounted occurrence of a view component, tagged with
//! a transition phase and a unique key. At most two instances coexist: one
//! `exiting` and one `entering` while a transition is in flight, exactly one
//! `stable` instance otherwise.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::snapshot::DataSnapshot;
use crate::types::directive::Mode;

/// Z-index of the exiting instance while both are rendered.
pub const Z_EXITING: u8 = 1;

/// Z-index of the entering instance while both are rendered.
pub const Z_ENTERING: u8 = 2;

/// Per-instance animation phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewPhase {
    /// Entrance animation in progress.
    Entering,
    /// Settled, the only rendered instance.
    Stable,
    /// Exit animation in progress; removed on collapse.
    Exiting,
}

impl fmt::Display for ViewPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entering => write!(f, "entering"),
            Self::Stable => write!(f, "stable"),
            Self::Exiting => write!(f, "exiting"),
        }
    }
}

/// Unique key for a view instance: mode, creation timestamp, and a
/// process-wide counter to break ties within one millisecond.
///
/// Doubles as the rendering key and the lookup key into the callback
/// registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceKey(String);

static KEY_COUNTER: AtomicU64 = AtomicU64::new(0);

impl InstanceKey {
    /// Mint a fresh key for a mode.
    pub fn next(mode: Mode) -> Self {
        let seq = KEY_COUNTER.fetch_add(1, Ordering::Relaxed);
        let ts = chrono::Utc::now().timestamp_millis();
        Self(format!("{mode}-{ts}-{seq}"))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One mounted view instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewInstanceState {
    /// Mode this instance renders.
    pub mode: Mode,
    /// Current transition phase.
    pub phase: ViewPhase,
    /// Stacking order while two instances overlap.
    pub z_index: u8,
    /// Unique rendering / registry key.
    pub key: InstanceKey,
    /// Render-ready data for this instance, owned for its whole lifetime.
    pub snapshot: DataSnapshot,
}

impl ViewInstanceState {
    /// Create a stable instance with a fresh key.
    pub fn stable(mode: Mode, snapshot: DataSnapshot) -> Self {
        Self {
            mode,
            phase: ViewPhase::Stable,
            z_index: Z_EXITING,
            key: InstanceKey::next(mode),
            snapshot,
        }
    }
}

/// The full transition state published to renderers.
///
/// Invariant: exactly one instance when idle, exactly two (one exiting, one
/// entering) while transitioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionState {
    /// Currently mounted instances, exiting first while transitioning.
    pub instances: Vec<ViewInstanceState>,
    /// Whether a transition is in flight.
    pub is_transitioning: bool,
}

impl TransitionState {
    /// Create an idle state holding a single stable instance.
    pub fn idle(instance: ViewInstanceState) -> Self {
        Self {
            instances: vec![instance],
            is_transitioning: false,
        }
    }

    /// The stable instance, when idle.
    pub fn stable(&self) -> Option<&ViewInstanceState> {
        self.instances
            .iter()
            .find(|i| i.phase == ViewPhase::Stable)
    }

    /// The exiting instance, while transitioning.
    pub fn exiting(&self) -> Option<&ViewInstanceState> {
        self.instances
            .iter()
            .find(|i| i.phase == ViewPhase::Exiting)
    }

    /// The entering instance, while transitioning.
    pub fn entering(&self) -> Option<&ViewInstanceState> {
        self.instances
            .iter()
            .find(|i| i.phase == ViewPhase::Entering)
    }

    /// Check the one-idle / two-transitioning invariant, including z-order.
    pub fn invariant_holds(&self) -> bool {
        if self.is_transitioning {
            match (self.exiting(), self.entering()) {
                (Some(out), Some(inn)) => {
                    self.instances.len() == 2 && out.z_index < inn.z_index
                }
                _ => false,
            }
        } else {
            self.instances.len() == 1 && self.stable().is_some()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::DataSnapshot;

    fn empty_snapshot() -> DataSnapshot {
        DataSnapshot::value_list(Vec::new())
    }

    #[test]
    fn test_keys_are_unique() {
        let a = InstanceKey::next(Mode::Landing);
        let b = InstanceKey::next(Mode::Landing);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("landing-"));
    }

    #[test]
    fn test_idle_invariant() {
        let state = TransitionState::idle(ViewInstanceState::stable(
            Mode::Landing,
            empty_snapshot(),
        ));
        assert!(state.invariant_holds());
        assert!(!state.is_transitioning);
        assert_eq!(state.stable().unwrap().mode, Mode::Landing);
    }

    #[test]
    fn test_transitioning_invariant_requires_z_order() {
        let mut exiting = ViewInstanceState::stable(Mode::Landing, empty_snapshot());
        exiting.phase = ViewPhase::Exiting;
        exiting.z_index = Z_EXITING;

        let mut entering = ViewInstanceState::stable(Mode::Timeline, empty_snapshot());
        entering.phase = ViewPhase::Entering;
        entering.z_index = Z_ENTERING;

        let state = TransitionState {
            instances: vec![exiting.clone(), entering.clone()],
            is_transitioning: true,
        };
        assert!(state.invariant_holds());

        // Flipped z-order violates the invariant.
        let mut bad_entering = entering;
        bad_entering.z_index = 0;
        let bad = TransitionState {
            instances: vec![exiting, bad_entering],
            is_transitioning: true,
        };
        assert!(!bad.invariant_holds());
    }
}
