//! # viewstate-kernel
//!
//! View transition and URL state synchronization for a directive-driven
//! portfolio UI.
//!
//! The kernel answers one question:
//!
//! > Given a new view directive, how does the UI get from the current view
//! > to the next one, and how does the URL stay truthful the whole time?
//!
//! ## Core Contract
//!
//! 1. Model every renderable view as a typed [`Directive`] (mode + variant +
//!    presentation fields)
//! 2. Encode the full directive into a single bounded, URL-safe `state`
//!    parameter, and decode it back without trusting the input
//! 3. Drive view changes through a strict exit-before-enter transition
//!    sequence that always collapses back to exactly one stable view
//! 4. Mirror store changes into the URL (debounced, push vs replace) and
//!    URL changes back into the store, without feedback loops
//!
//! ## Architecture
//!
//! ```text
//! Directive → DirectiveStore → TransitionManager → TransitionState
//!                  ↕                   ↓
//!          UrlSyncController     build_snapshot(graph, directive)
//!                  ↕
//!            HistoryBackend (browser or memory)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same graph + same directive → identical [`DataSnapshot`]
//! - Snapshot equality is decided by a canonical hash, never by identity
//! - Encode/decode of a valid directive is lossless, unknown fields included

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod codec;
pub mod registry;
pub mod snapshot;
pub mod store;
pub mod sync;
pub mod transition;
pub mod types;

// Re-exports
pub use types::{
    CompareVariant, Directive, DirectiveData, ExploreVariant, LandingVariant, Mode,
    ProjectsVariant, ResumeVariant, SkillsVariant, ThemeCatalog, ThemeName, TimelineVariant,
    ValuesVariant, DEFAULT_CONFIDENCE, MAX_HIGHLIGHTS,
};
pub use types::{GraphEdge, Node, NodeId, NodeKind, Period, PortfolioGraph};
pub use types::{InstanceKey, TransitionState, ViewInstanceState, ViewPhase, Z_ENTERING, Z_EXITING};

pub use canonical::{canonical_hash, to_canonical_bytes};
pub use codec::{
    decode_state, encode_state, ensure_theme, to_store_directive, validate_directive, CodecError,
    HARD_CAP, UNCOMPRESSED_THRESHOLD,
};
pub use registry::{CallbackRegistry, ViewTransitionHooks};
pub use snapshot::{build_snapshot, DataSnapshot};
pub use store::{DirectiveOrigin, DirectiveStore, DirectiveSubscriber};
pub use sync::{
    should_push, HistoryBackend, InMemoryHistory, UrlSyncController, DEFAULT_DEBOUNCE,
};
pub use transition::{Timing, TimingTable, TransitionManager, DEFAULT_CALLBACK_TIMEOUT};
