//! The state machine engine.
//!
//! A [`StateMachine`] owns a validated graph of named states and named
//! transitions, tracks the single current state, and runs the eight-phase
//! cancelable hook pipeline around every state change (see [`pipeline`]).
//!
//! The handle is cheap to clone; clones share the same machine. At most one
//! guarded operation is in flight at a time: a second one fails immediately
//! with `PendingState` rather than queueing.

mod pipeline;

use crate::config::Config;
use crate::core::graph::{Graph, StateNode, StatesSpec, TransitionsSpec};
use crate::core::hook::{Hook, HookList, Transport};
use crate::core::source::Source;
use crate::error::StateMachineError;
use crate::snapshot::HydratedState;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

struct Inner {
    graph: Graph,
    /// Index into `graph.states`. The authoritative "current" marker.
    current: AtomicUsize,
    transport: Transport,
    pending: AtomicBool,
    before_each_state: Mutex<Vec<Hook>>,
    after_each_state: Mutex<Vec<Hook>>,
    before_each_transition: Mutex<Vec<Hook>>,
    after_each_transition: Mutex<Vec<Hook>>,
    config: Config,
}

/// An embeddable finite-state machine with cancelable async lifecycle hooks.
///
/// Construct one per stateful entity via [`StateMachine::new`] or the
/// [`StateMachineBuilder`](crate::builder::StateMachineBuilder).
pub struct StateMachine {
    inner: Arc<Inner>,
}

impl Clone for StateMachine {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("state", &self.current_node().name)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Clears the pending flag when the guarded operation settles, on every exit
/// path.
struct PendingPermit<'a>(&'a AtomicBool);

impl Drop for PendingPermit<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl StateMachine {
    /// Build a machine from its initial state name, state specs, transition
    /// specs, and configuration.
    ///
    /// `states` and `transitions` accept either a bare `Vec` of specs or a
    /// [`StatesSpec`] / [`TransitionsSpec`] carrying machine-wide each-hooks
    /// alongside the list.
    ///
    /// Fails with `DuplicatedState`, `AbsentState` (a transition endpoint or
    /// the initial state is undeclared), or `DuplicatedTransition`.
    pub fn new(
        initial: impl Into<String>,
        states: impl Into<StatesSpec>,
        transitions: impl Into<TransitionsSpec>,
        config: Config,
    ) -> Result<Self, StateMachineError> {
        let states = states.into();
        let transitions = transitions.into();

        let graph = Graph::build(states.list, transitions.list).map_err(|e| config.report(e))?;

        let initial = initial.into();
        let current = match graph.state_index(&initial) {
            Some(index) => index,
            None => {
                return Err(config.report(StateMachineError::AbsentState { name: initial }));
            }
        };

        Ok(Self {
            inner: Arc::new(Inner {
                graph,
                current: AtomicUsize::new(current),
                transport: Transport::new(),
                pending: AtomicBool::new(false),
                before_each_state: Mutex::new(states.before),
                after_each_state: Mutex::new(states.after),
                before_each_transition: Mutex::new(transitions.before),
                after_each_transition: Mutex::new(transitions.after),
                config,
            }),
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Name of the current state.
    pub fn state(&self) -> String {
        self.current_node().name.clone()
    }

    /// Every declared state name, in declaration order.
    pub fn all_states(&self) -> Vec<String> {
        self.inner.graph.state_names()
    }

    /// Names of states reachable from the current state, in
    /// transition-declaration order. Duplicates are possible when two
    /// transitions share a target.
    pub fn states(&self) -> Vec<String> {
        let current = self.current_node().name.clone();
        self.inner
            .graph
            .edges_from(&current)
            .map(|t| t.to.clone())
            .collect()
    }

    /// Every declared transition name, in declaration order.
    pub fn all_transitions(&self) -> Vec<String> {
        self.inner.graph.transition_names()
    }

    /// Names of transitions available from the current state, in
    /// declaration order.
    pub fn transitions(&self) -> Vec<String> {
        let current = self.current_node().name.clone();
        self.inner
            .graph
            .edges_from(&current)
            .map(|t| t.name.clone())
            .collect()
    }

    /// Whether a guarded operation is currently in flight.
    pub fn is_pending(&self) -> bool {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Handle to the transport bag shared by all hooks and persisted through
    /// snapshots.
    pub fn transport(&self) -> Transport {
        self.inner.transport.clone()
    }

    /// Payload data of the current state.
    pub fn data(&self) -> Value {
        self.current_node().data.lock().clone()
    }

    /// A deep, disconnected snapshot of `{state, data, transport}`.
    ///
    /// Two successive calls produce equal values that share no structure
    /// with each other or with the live machine.
    pub fn dehydrated(&self) -> HydratedState {
        let node = self.current_node();
        HydratedState {
            state: node.name.clone(),
            data: node.data.lock().clone(),
            transport: self.inner.transport.to_map(),
        }
    }

    /// Restore the machine to a previously dehydrated state.
    ///
    /// Replaces the current-state pointer, that state's data, and the
    /// transport bag wholesale. No hooks fire. Fails with `AbsentState` if
    /// the snapshot names a state this machine does not declare.
    pub fn hydrate(&self, snapshot: HydratedState) -> Result<(), StateMachineError> {
        let Some(index) = self.inner.graph.state_index(&snapshot.state) else {
            return Err(self
                .inner
                .config
                .report(StateMachineError::AbsentState {
                    name: snapshot.state,
                }));
        };

        self.inner.current.store(index, Ordering::Release);
        *self.inner.graph.states[index].data.lock() = snapshot.data;
        self.inner.transport.replace(snapshot.transport);
        tracing::debug!(state = %snapshot.state, "machine hydrated");
        Ok(())
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    /// Whether the machine is in the named state.
    ///
    /// Guarded: fails with `PendingState` while another guarded operation is
    /// in flight, like the mutators do.
    pub async fn is(
        &self,
        target: impl Into<Source<String>>,
    ) -> Result<bool, StateMachineError> {
        let _permit = self.acquire_pending()?;
        let name = target.into().resolve().await;
        Ok(self.current_node().name == name)
    }

    /// Whether a transition from the current state leads to the named state.
    ///
    /// Guarded like [`StateMachine::is`].
    pub async fn can_transit_to(
        &self,
        target: impl Into<Source<String>>,
    ) -> Result<bool, StateMachineError> {
        let _permit = self.acquire_pending()?;
        let name = target.into().resolve().await;
        let current = self.current_node().name.clone();
        let found = self.inner.graph.edges_from(&current).any(|t| t.to == name);
        Ok(found)
    }

    /// Whether the named transition is available from the current state.
    ///
    /// Guarded like [`StateMachine::is`].
    pub async fn can_do_transition(
        &self,
        target: impl Into<Source<String>>,
    ) -> Result<bool, StateMachineError> {
        let _permit = self.acquire_pending()?;
        let name = target.into().resolve().await;
        let current = self.current_node().name.clone();
        let found = self.inner.graph.edges_from(&current).any(|t| t.name == name);
        Ok(found)
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    /// Transit to the named state.
    ///
    /// Fails with `AbsentState` if the state is undeclared and with
    /// `UnavailableState` if no transition leads there from the current
    /// state. A hook veto is not an error: the machine is returned
    /// unchanged.
    pub async fn transit_to(
        &self,
        target: impl Into<Source<String>>,
    ) -> Result<&Self, StateMachineError> {
        self.transit_to_with(target, Vec::new()).await
    }

    /// [`StateMachine::transit_to`] with extra arguments forwarded to every
    /// hook in the pipeline.
    pub async fn transit_to_with(
        &self,
        target: impl Into<Source<String>>,
        args: Vec<Value>,
    ) -> Result<&Self, StateMachineError> {
        let _permit = self.acquire_pending()?;
        let name = target.into().resolve().await;

        let Some(target_index) = self.inner.graph.state_index(&name) else {
            return Err(self
                .inner
                .config
                .report(StateMachineError::AbsentState { name }));
        };

        let current = self.current_node().name.clone();
        let Some(edge_index) = self
            .inner
            .graph
            .transitions
            .iter()
            .position(|t| t.from == current && t.to == name)
        else {
            return Err(self
                .inner
                .config
                .report(StateMachineError::UnavailableState {
                    from: current,
                    to: name,
                }));
        };

        self.run_pipeline(edge_index, target_index, Arc::from(args))
            .await?;
        Ok(self)
    }

    /// Do the named transition.
    ///
    /// Fails with `AbsentTransition` if no transition has that name and with
    /// `UnavailableTransition` if none with that name starts at the current
    /// state. A hook veto is not an error: the machine is returned
    /// unchanged.
    pub async fn do_transition(
        &self,
        target: impl Into<Source<String>>,
    ) -> Result<&Self, StateMachineError> {
        self.do_transition_with(target, Vec::new()).await
    }

    /// [`StateMachine::do_transition`] with extra arguments forwarded to
    /// every hook in the pipeline.
    pub async fn do_transition_with(
        &self,
        target: impl Into<Source<String>>,
        args: Vec<Value>,
    ) -> Result<&Self, StateMachineError> {
        let _permit = self.acquire_pending()?;
        let name = target.into().resolve().await;

        if !self.inner.graph.transitions.iter().any(|t| t.name == name) {
            return Err(self
                .inner
                .config
                .report(StateMachineError::AbsentTransition { name }));
        }

        let current = self.current_node().name.clone();
        let Some(edge_index) = self
            .inner
            .graph
            .transitions
            .iter()
            .position(|t| t.from == current && t.name == name)
        else {
            return Err(self
                .inner
                .config
                .report(StateMachineError::UnavailableTransition {
                    name,
                    from: current,
                }));
        };

        // Validation guarantees the edge's target exists.
        let to = self.inner.graph.transitions[edge_index].to.clone();
        let Some(target_index) = self.inner.graph.state_index(&to) else {
            return Err(self
                .inner
                .config
                .report(StateMachineError::AbsentState { name: to }));
        };

        self.run_pipeline(edge_index, target_index, Arc::from(args))
            .await?;
        Ok(self)
    }

    // =========================================================================
    // Hook registration
    // =========================================================================

    /// Append one hook or a list to the machine-wide before-each-transition
    /// hooks (phase 3).
    pub fn on_before_transition(&self, hooks: impl Into<HookList>) {
        self.inner
            .before_each_transition
            .lock()
            .extend(hooks.into().0);
    }

    /// Append one hook or a list to the machine-wide after-each-transition
    /// hooks (phase 6).
    pub fn on_after_transition(&self, hooks: impl Into<HookList>) {
        self.inner
            .after_each_transition
            .lock()
            .extend(hooks.into().0);
    }

    /// Append one hook or a list to the machine-wide before-each-state hooks
    /// (phase 8).
    pub fn on_before_state(&self, hooks: impl Into<HookList>) {
        self.inner.before_each_state.lock().extend(hooks.into().0);
    }

    /// Append one hook or a list to the machine-wide after-each-state hooks
    /// (phase 1).
    pub fn on_after_state(&self, hooks: impl Into<HookList>) {
        self.inner.after_each_state.lock().extend(hooks.into().0);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn current_node(&self) -> &StateNode {
        &self.inner.graph.states[self.inner.current.load(Ordering::Acquire)]
    }

    /// Admit a guarded operation or reject it with `PendingState`. The
    /// returned permit clears the flag when dropped, so a failed operation
    /// cannot wedge the machine.
    fn acquire_pending(&self) -> Result<PendingPermit<'_>, StateMachineError> {
        if self
            .inner
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(self.inner.config.report(StateMachineError::PendingState));
        }
        Ok(PendingPermit(&self.inner.pending))
    }

    pub(crate) fn inner_graph(&self) -> &Graph {
        &self.inner.graph
    }

    pub(crate) fn inner_config(&self) -> &Config {
        &self.inner.config
    }

    pub(crate) fn inner_transport(&self) -> &Transport {
        &self.inner.transport
    }

    pub(crate) fn current_index(&self) -> usize {
        self.inner.current.load(Ordering::Acquire)
    }

    pub(crate) fn set_current_index(&self, index: usize) {
        self.inner.current.store(index, Ordering::Release);
    }

    pub(crate) fn each_hooks(&self, phase: EachPhase) -> Vec<Hook> {
        let list = match phase {
            EachPhase::AfterEachState => &self.inner.after_each_state,
            EachPhase::BeforeEachTransition => &self.inner.before_each_transition,
            EachPhase::AfterEachTransition => &self.inner.after_each_transition,
            EachPhase::BeforeEachState => &self.inner.before_each_state,
        };
        list.lock().clone()
    }
}

/// The four machine-wide hook lists, mutable for the machine's lifetime.
#[derive(Clone, Copy)]
pub(crate) enum EachPhase {
    AfterEachState,
    BeforeEachTransition,
    AfterEachTransition,
    BeforeEachState,
}
