//! The validated state/transition graph.
//!
//! Construction input arrives as [`StateSpec`] / [`TransitionSpec`] records
//! (hook lists optional, defaulting to empty). [`Graph::build`] normalizes
//! them, rejects duplicate state names, transitions referencing unknown
//! states, and duplicate `(from, name)` transition pairs, and produces an
//! immutable store that preserves declaration order for every query.

use crate::core::hook::{Hook, HookList};
use crate::error::StateMachineError;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;

/// A declared state: a unique name, opaque payload data, and hooks run when
/// this state becomes or stops being current.
pub struct StateSpec {
    pub(crate) name: String,
    pub(crate) data: Value,
    pub(crate) before: Vec<Hook>,
    pub(crate) after: Vec<Hook>,
}

impl StateSpec {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Hooks run when this state is about to become current (phase 7).
    pub fn before(mut self, hooks: impl Into<HookList>) -> Self {
        self.before.extend(hooks.into().0);
        self
    }

    /// Hooks run when this state stops being current (phase 2).
    pub fn after(mut self, hooks: impl Into<HookList>) -> Self {
        self.after.extend(hooks.into().0);
        self
    }
}

/// A declared transition: a directed edge between two states, unique per
/// `(from, name)` pair, with its own before/after hooks.
pub struct TransitionSpec {
    pub(crate) name: String,
    pub(crate) from: String,
    pub(crate) to: String,
    pub(crate) before: Vec<Hook>,
    pub(crate) after: Vec<Hook>,
}

impl TransitionSpec {
    pub fn new(
        name: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from: from.into(),
            to: to.into(),
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Hooks run before the state pointer swaps (phase 4).
    pub fn before(mut self, hooks: impl Into<HookList>) -> Self {
        self.before.extend(hooks.into().0);
        self
    }

    /// Hooks run after the state pointer swaps (phase 5).
    pub fn after(mut self, hooks: impl Into<HookList>) -> Self {
        self.after.extend(hooks.into().0);
        self
    }
}

/// The states half of the construction input: a bare list, optionally with
/// machine-wide before/after-each-state hooks attached at construction.
#[derive(Default)]
pub struct StatesSpec {
    pub(crate) list: Vec<StateSpec>,
    pub(crate) before: Vec<Hook>,
    pub(crate) after: Vec<Hook>,
}

impl StatesSpec {
    pub fn new(list: Vec<StateSpec>) -> Self {
        Self {
            list,
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Machine-wide before-each-state hooks (phase 8).
    pub fn before(mut self, hooks: impl Into<HookList>) -> Self {
        self.before.extend(hooks.into().0);
        self
    }

    /// Machine-wide after-each-state hooks (phase 1).
    pub fn after(mut self, hooks: impl Into<HookList>) -> Self {
        self.after.extend(hooks.into().0);
        self
    }
}

impl From<Vec<StateSpec>> for StatesSpec {
    fn from(list: Vec<StateSpec>) -> Self {
        Self::new(list)
    }
}

/// The transitions half of the construction input, mirroring [`StatesSpec`].
#[derive(Default)]
pub struct TransitionsSpec {
    pub(crate) list: Vec<TransitionSpec>,
    pub(crate) before: Vec<Hook>,
    pub(crate) after: Vec<Hook>,
}

impl TransitionsSpec {
    pub fn new(list: Vec<TransitionSpec>) -> Self {
        Self {
            list,
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    /// Machine-wide before-each-transition hooks (phase 3).
    pub fn before(mut self, hooks: impl Into<HookList>) -> Self {
        self.before.extend(hooks.into().0);
        self
    }

    /// Machine-wide after-each-transition hooks (phase 6).
    pub fn after(mut self, hooks: impl Into<HookList>) -> Self {
        self.after.extend(hooks.into().0);
        self
    }
}

impl From<Vec<TransitionSpec>> for TransitionsSpec {
    fn from(list: Vec<TransitionSpec>) -> Self {
        Self::new(list)
    }
}

/// A validated state record. `data` is replaceable wholesale by hydration;
/// everything else is immutable after construction.
pub(crate) struct StateNode {
    pub(crate) name: String,
    pub(crate) data: Mutex<Value>,
    pub(crate) before: Vec<Hook>,
    pub(crate) after: Vec<Hook>,
}

/// A validated transition record. Immutable after construction.
pub(crate) struct TransitionEdge {
    pub(crate) name: String,
    pub(crate) from: String,
    pub(crate) to: String,
    pub(crate) before: Vec<Hook>,
    pub(crate) after: Vec<Hook>,
}

/// The immutable-after-construction store of states and transitions, in
/// declaration order.
pub(crate) struct Graph {
    pub(crate) states: Vec<StateNode>,
    pub(crate) transitions: Vec<TransitionEdge>,
}

impl std::fmt::Debug for StateNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateNode").field("name", &self.name).finish_non_exhaustive()
    }
}

impl std::fmt::Debug for TransitionEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionEdge")
            .field("name", &self.name)
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("states", &self.states)
            .field("transitions", &self.transitions)
            .finish()
    }
}

impl Graph {
    /// Validate the supplied records and build the store.
    pub(crate) fn build(
        states: Vec<StateSpec>,
        transitions: Vec<TransitionSpec>,
    ) -> Result<Self, StateMachineError> {
        let mut seen_states: HashSet<&str> = HashSet::new();
        for state in &states {
            if !seen_states.insert(&state.name) {
                return Err(StateMachineError::DuplicatedState {
                    name: state.name.clone(),
                });
            }
        }

        let mut seen_edges: HashSet<(&str, &str)> = HashSet::new();
        for transition in &transitions {
            if !seen_states.contains(transition.from.as_str()) {
                return Err(StateMachineError::AbsentState {
                    name: transition.from.clone(),
                });
            }
            if !seen_states.contains(transition.to.as_str()) {
                return Err(StateMachineError::AbsentState {
                    name: transition.to.clone(),
                });
            }
            if !seen_edges.insert((&transition.from, &transition.name)) {
                return Err(StateMachineError::DuplicatedTransition {
                    name: transition.name.clone(),
                    from: transition.from.clone(),
                });
            }
        }

        Ok(Self {
            states: states
                .into_iter()
                .map(|s| StateNode {
                    name: s.name,
                    data: Mutex::new(s.data),
                    before: s.before,
                    after: s.after,
                })
                .collect(),
            transitions: transitions
                .into_iter()
                .map(|t| TransitionEdge {
                    name: t.name,
                    from: t.from,
                    to: t.to,
                    before: t.before,
                    after: t.after,
                })
                .collect(),
        })
    }

    pub(crate) fn state_index(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s.name == name)
    }

    /// Transitions whose `from` is the given state, in declaration order.
    pub(crate) fn edges_from<'a>(
        &'a self,
        from: &'a str,
    ) -> impl Iterator<Item = &'a TransitionEdge> + 'a {
        self.transitions.iter().filter(move |t| t.from == from)
    }

    pub(crate) fn state_names(&self) -> Vec<String> {
        self.states.iter().map(|s| s.name.clone()).collect()
    }

    pub(crate) fn transition_names(&self) -> Vec<String> {
        self.transitions.iter().map(|t| t.name.clone()).collect()
    }
}
