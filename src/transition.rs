//! View transition state machine.
//!
//! Orchestrates at most two concurrent view instances: when the directive
//! changes meaningfully, the stable instance flips to `exiting`, a fresh
//! `entering` instance is published above it, and the manager sequences
//! exit-out strictly before enter-in, enforcing the timing table's minimum
//! waits itself rather than trusting the component hooks. When both phases
//! finish the state collapses back to a single stable instance.
//!
//! A directive arriving while a transition is in flight is queued
//! latest-wins and replayed after the collapse.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash;
use crate::registry::CallbackRegistry;
use crate::snapshot::build_snapshot;
use crate::types::{
    Directive, InstanceKey, Mode, PortfolioGraph, TransitionState, ViewInstanceState, ViewPhase,
    Z_ENTERING, Z_EXITING,
};

/// How long the manager waits on a single hook before force-advancing.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Per-mode animation timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// Entrance duration in milliseconds.
    pub in_ms: u64,
    /// Exit duration in milliseconds.
    pub out_ms: u64,
}

impl Timing {
    /// Create a timing entry.
    pub fn new(in_ms: u64, out_ms: u64) -> Self {
        Self { in_ms, out_ms }
    }
}

/// Per-mode timing table. Modes without an entry fall back to the landing
/// entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingTable {
    entries: std::collections::BTreeMap<Mode, Timing>,
}

impl Default for TimingTable {
    fn default() -> Self {
        let entries = [
            (Mode::Landing, Timing::new(600, 400)),
            (Mode::Timeline, Timing::new(800, 500)),
            (Mode::Projects, Timing::new(700, 450)),
            (Mode::Skills, Timing::new(700, 450)),
            (Mode::Values, Timing::new(650, 400)),
            (Mode::Compare, Timing::new(750, 500)),
            (Mode::Explore, Timing::new(600, 400)),
            (Mode::Resume, Timing::new(500, 350)),
        ]
        .into_iter()
        .collect();
        Self { entries }
    }
}

impl TimingTable {
    /// A uniform table, useful for tests.
    pub fn uniform(timing: Timing) -> Self {
        let entries = [
            Mode::Landing,
            Mode::Timeline,
            Mode::Projects,
            Mode::Skills,
            Mode::Values,
            Mode::Compare,
            Mode::Explore,
            Mode::Resume,
        ]
        .into_iter()
        .map(|m| (m, timing))
        .collect();
        Self { entries }
    }

    /// Override one mode's timing.
    pub fn with_entry(mut self, mode: Mode, timing: Timing) -> Self {
        self.entries.insert(mode, timing);
        self
    }

    /// Timing for a mode, falling back to the landing entry.
    pub fn timing(&self, mode: Mode) -> Timing {
        self.entries
            .get(&mode)
            .or_else(|| self.entries.get(&Mode::Landing))
            .copied()
            .unwrap_or(Timing::new(600, 400))
    }
}

/// The view transition state machine.
///
/// Single logical mutator of its [`TransitionState`]; the state lock is
/// never held across an await.
pub struct TransitionManager {
    state: Mutex<TransitionState>,
    registry: Arc<CallbackRegistry>,
    timings: TimingTable,
    callback_timeout: Duration,
    pending: Mutex<Option<Directive>>,
    closed: AtomicBool,
}

impl TransitionManager {
    /// Create a manager idle on the given directive's view.
    pub fn new(
        registry: Arc<CallbackRegistry>,
        timings: TimingTable,
        graph: &PortfolioGraph,
        initial: &Directive,
    ) -> Self {
        let snapshot = build_snapshot(graph, initial);
        let instance = ViewInstanceState::stable(initial.mode(), snapshot);
        Self {
            state: Mutex::new(TransitionState::idle(instance)),
            registry,
            timings,
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
            pending: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// Override the per-hook force-advance timeout.
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Current published state.
    pub fn state(&self) -> TransitionState {
        self.state.lock().clone()
    }

    /// Whether a transition is in flight.
    pub fn is_transitioning(&self) -> bool {
        self.state.lock().is_transitioning
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Apply a directive change: derive the snapshot, and if it differs
    /// meaningfully from the stable instance, run a full transition.
    ///
    /// Directives arriving while a transition is in flight are queued
    /// latest-wins; this call drains the queue before returning.
    pub async fn apply(&self, graph: &PortfolioGraph, directive: &Directive) {
        let mut current = directive.clone();
        loop {
            if self.is_closed() {
                return;
            }

            let snapshot = build_snapshot(graph, &current);
            let plan = {
                let mut st = self.state.lock();
                if st.is_transitioning {
                    *self.pending.lock() = Some(current);
                    tracing::debug!("transition in flight; queueing directive");
                    return;
                }

                let (exit_key, exit_mode, stable_hash) = match st.stable() {
                    Some(s) => (s.key.clone(), s.mode, canonical_hash(&s.snapshot)),
                    None => {
                        st.instances =
                            vec![ViewInstanceState::stable(current.mode(), snapshot)];
                        return;
                    }
                };

                if exit_mode == current.mode() && stable_hash == canonical_hash(&snapshot) {
                    tracing::debug!(mode = %exit_mode, "snapshot unchanged; skipping transition");
                    return;
                }

                let enter_mode = current.mode();
                let enter_key = InstanceKey::next(enter_mode);

                // The only point both instances are rendered together:
                // exiting below, entering above, for cross-fade overlap.
                st.instances[0].phase = ViewPhase::Exiting;
                st.instances[0].z_index = Z_EXITING;
                st.instances.push(ViewInstanceState {
                    mode: enter_mode,
                    phase: ViewPhase::Entering,
                    z_index: Z_ENTERING,
                    key: enter_key.clone(),
                    snapshot,
                });
                st.is_transitioning = true;

                (exit_key, exit_mode, enter_key, enter_mode)
            };

            tracing::debug!(
                from = %plan.1,
                to = %plan.3,
                "starting view transition"
            );
            self.run(plan).await;

            let next = self.pending.lock().take();
            match next {
                Some(next) => current = next,
                None => return,
            }
        }
    }

    async fn run(&self, plan: (InstanceKey, Mode, InstanceKey, Mode)) {
        let (exit_key, exit_mode, enter_key, enter_mode) = plan;
        let out_wait = Duration::from_millis(self.timings.timing(exit_mode).out_ms);
        let in_wait = Duration::from_millis(self.timings.timing(enter_mode).in_ms);

        // Exit fully completes, hook and enforced wait, before enter starts.
        self.invoke_out(&exit_key, out_wait).await;
        if self.is_closed() {
            return;
        }
        tokio::time::sleep(out_wait).await;
        if self.is_closed() {
            return;
        }

        self.invoke_in(&enter_key, in_wait).await;
        if self.is_closed() {
            return;
        }
        tokio::time::sleep(in_wait).await;

        self.collapse(&exit_key);
    }

    async fn invoke_out(&self, key: &InstanceKey, duration: Duration) {
        let Some(hooks) = self.registry.get(key) else {
            tracing::debug!(key = %key, "no exit hooks registered; continuing");
            return;
        };
        if tokio::time::timeout(self.callback_timeout, hooks.on_transition_out(duration))
            .await
            .is_err()
        {
            tracing::warn!(key = %key, "exit hook timed out; force-advancing");
        }
    }

    async fn invoke_in(&self, key: &InstanceKey, duration: Duration) {
        let Some(hooks) = self.registry.get(key) else {
            tracing::debug!(key = %key, "no entrance hooks registered; continuing");
            return;
        };
        if tokio::time::timeout(self.callback_timeout, hooks.on_transition_in(duration))
            .await
            .is_err()
        {
            tracing::warn!(key = %key, "entrance hook timed out; force-advancing");
        }
    }

    fn collapse(&self, exit_key: &InstanceKey) {
        {
            let mut st = self.state.lock();
            st.instances.retain(|i| i.phase != ViewPhase::Exiting);
            if let Some(settled) = st.instances.first_mut() {
                settled.phase = ViewPhase::Stable;
                settled.z_index = Z_EXITING;
            }
            st.is_transitioning = false;
        }
        self.registry.remove(exit_key);
        tracing::debug!(key = %exit_key, "transition collapsed to stable");
    }

    /// Tear down: no further transitions start, pending work is dropped, and
    /// the registry is closed so it is never consulted again.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        *self.pending.lock() = None;
        self.registry.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ViewTransitionHooks;
    use crate::types::{DirectiveData, ThemeName, TimelineVariant};
    use async_trait::async_trait;
    use parking_lot::Mutex as PlMutex;

    fn graph() -> PortfolioGraph {
        use crate::types::{GraphEdge, Node, NodeKind};
        let mut g = PortfolioGraph::new();
        g.add_node(Node::new("p1", "Project", NodeKind::Project));
        g.add_node(Node::new("s1", "Skill", NodeKind::Skill));
        g.add_edge(GraphEdge::new("p1", "s1", 0.7));
        g
    }

    fn landing() -> Directive {
        Directive::landing(ThemeName::from("cold"))
    }

    fn timeline() -> Directive {
        Directive::Timeline(
            DirectiveData::new(TimelineVariant::Eras).with_theme(ThemeName::from("cold")),
        )
    }

    struct RecordingHooks {
        events: Arc<PlMutex<Vec<String>>>,
        name: &'static str,
    }

    #[async_trait]
    impl ViewTransitionHooks for RecordingHooks {
        async fn on_transition_in(&self, _d: Duration) {
            self.events.lock().push(format!("{}:in", self.name));
        }

        async fn on_transition_out(&self, _d: Duration) {
            self.events.lock().push(format!("{}:out", self.name));
        }
    }

    struct HangingHooks;

    #[async_trait]
    impl ViewTransitionHooks for HangingHooks {
        async fn on_transition_in(&self, _d: Duration) {
            std::future::pending::<()>().await;
        }

        async fn on_transition_out(&self, _d: Duration) {
            std::future::pending::<()>().await;
        }
    }

    fn fast_manager(registry: Arc<CallbackRegistry>) -> TransitionManager {
        TransitionManager::new(
            registry,
            TimingTable::uniform(Timing::new(20, 20)),
            &graph(),
            &landing(),
        )
    }

    #[tokio::test]
    async fn test_transition_publishes_two_then_collapses() {
        let registry = CallbackRegistry::new();
        let mgr = Arc::new(fast_manager(Arc::clone(&registry)));

        let g = graph();
        let m = Arc::clone(&mgr);
        let handle = tokio::spawn(async move {
            m.apply(&g, &timeline()).await;
        });

        // Mid-flight: two instances, exiting below entering.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let st = mgr.state();
        assert!(st.is_transitioning);
        assert_eq!(st.instances.len(), 2);
        assert!(st.invariant_holds());
        assert_eq!(st.exiting().unwrap().mode, Mode::Landing);
        assert_eq!(st.entering().unwrap().mode, Mode::Timeline);

        handle.await.unwrap();
        let st = mgr.state();
        assert!(!st.is_transitioning);
        assert_eq!(st.instances.len(), 1);
        assert!(st.invariant_holds());
        assert_eq!(st.stable().unwrap().mode, Mode::Timeline);
    }

    #[tokio::test]
    async fn test_unchanged_directive_is_skipped() {
        let registry = CallbackRegistry::new();
        let mgr = fast_manager(registry);
        let key_before = mgr.state().stable().unwrap().key.clone();

        mgr.apply(&graph(), &landing()).await;

        let st = mgr.state();
        assert!(!st.is_transitioning);
        assert_eq!(st.stable().unwrap().key, key_before);
    }

    #[tokio::test]
    async fn test_out_hook_runs_before_in_hook() {
        let registry = CallbackRegistry::new();
        let mgr = Arc::new(fast_manager(Arc::clone(&registry)));
        let events = Arc::new(PlMutex::new(Vec::new()));

        // The initially stable instance registers its hooks on mount.
        let stable_key = mgr.state().stable().unwrap().key.clone();
        registry.register(
            stable_key,
            Arc::new(RecordingHooks {
                events: Arc::clone(&events),
                name: "landing",
            }),
        );

        let g = graph();
        let m = Arc::clone(&mgr);
        let handle = tokio::spawn(async move {
            m.apply(&g, &timeline()).await;
        });

        // The entering component mounts during the exit phase and registers.
        tokio::time::sleep(Duration::from_millis(5)).await;
        let entering_key = mgr.state().entering().unwrap().key.clone();
        registry.register(
            entering_key,
            Arc::new(RecordingHooks {
                events: Arc::clone(&events),
                name: "timeline",
            }),
        );

        handle.await.unwrap();
        assert_eq!(
            *events.lock(),
            vec!["landing:out".to_string(), "timeline:in".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_hooks_never_block() {
        let registry = CallbackRegistry::new();
        let mgr = fast_manager(registry);

        tokio::time::timeout(Duration::from_secs(2), mgr.apply(&graph(), &timeline()))
            .await
            .expect("transition with no registered hooks must complete");

        assert_eq!(mgr.state().stable().unwrap().mode, Mode::Timeline);
    }

    #[tokio::test]
    async fn test_hanging_hook_is_force_advanced() {
        let registry = CallbackRegistry::new();
        let mgr = fast_manager(Arc::clone(&registry))
            .with_callback_timeout(Duration::from_millis(30));

        let stable_key = mgr.state().stable().unwrap().key.clone();
        registry.register(stable_key, Arc::new(HangingHooks));

        tokio::time::timeout(Duration::from_secs(2), mgr.apply(&graph(), &timeline()))
            .await
            .expect("hung hook must not stall the machine");

        assert_eq!(mgr.state().stable().unwrap().mode, Mode::Timeline);
    }

    #[tokio::test]
    async fn test_request_while_transitioning_is_queued_latest_wins() {
        use crate::types::{ProjectsVariant, SkillsVariant};

        let registry = CallbackRegistry::new();
        let mgr = Arc::new(fast_manager(registry));

        let g = graph();
        let m = Arc::clone(&mgr);
        let handle = tokio::spawn(async move {
            m.apply(&g, &timeline()).await;
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(mgr.is_transitioning());

        let projects = Directive::Projects(
            DirectiveData::new(ProjectsVariant::Grid).with_theme(ThemeName::from("cold")),
        );
        let skills = Directive::Skills(
            DirectiveData::new(SkillsVariant::Matrix).with_theme(ThemeName::from("cold")),
        );

        // Both return immediately; only the latest survives the queue.
        mgr.apply(&graph(), &projects).await;
        mgr.apply(&graph(), &skills).await;

        handle.await.unwrap();
        let st = mgr.state();
        assert!(!st.is_transitioning);
        assert_eq!(st.stable().unwrap().mode, Mode::Skills);
    }

    #[tokio::test]
    async fn test_close_stops_new_transitions() {
        let registry = CallbackRegistry::new();
        let mgr = fast_manager(registry);

        mgr.close();
        mgr.apply(&graph(), &timeline()).await;

        assert_eq!(mgr.state().stable().unwrap().mode, Mode::Landing);
    }

    #[test]
    fn test_timing_table_falls_back_to_landing() {
        let table = TimingTable::default().with_entry(Mode::Landing, Timing::new(111, 99));
        let mut bare = TimingTable {
            entries: std::collections::BTreeMap::new(),
        };
        bare.entries.insert(Mode::Landing, Timing::new(111, 99));

        assert_eq!(bare.timing(Mode::Compare), Timing::new(111, 99));
        assert_eq!(table.timing(Mode::Landing), Timing::new(111, 99));
    }
}
