//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::config::Config;
use crate::core::graph::{StateSpec, StatesSpec, TransitionSpec, TransitionsSpec};
use crate::core::hook::HookList;
use crate::machine::StateMachine;
use serde_json::Value;
use std::time::Duration;

/// Builder for constructing state machines with a fluent API.
///
/// An alternative to [`StateMachine::new`] for callers that assemble the
/// graph piecemeal, or that want machine-wide each-hooks attached without
/// going through [`StatesSpec`] / [`TransitionsSpec`] by hand.
#[derive(Default)]
pub struct StateMachineBuilder {
    initial: Option<String>,
    states: Vec<StateSpec>,
    transitions: Vec<TransitionSpec>,
    before_each_state: HookList,
    after_each_state: HookList,
    before_each_transition: HookList,
    after_each_transition: HookList,
    config: Config,
}

impl StateMachineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial state name (required).
    pub fn initial(mut self, name: impl Into<String>) -> Self {
        self.initial = Some(name.into());
        self
    }

    /// Add a state with a payload and no hooks.
    pub fn state(mut self, name: impl Into<String>, data: Value) -> Self {
        self.states.push(StateSpec::new(name, data));
        self
    }

    /// Add a fully specified state.
    pub fn state_spec(mut self, spec: StateSpec) -> Self {
        self.states.push(spec);
        self
    }

    /// Add multiple states at once.
    pub fn states(mut self, specs: Vec<StateSpec>) -> Self {
        self.states.extend(specs);
        self
    }

    /// Add a transition with no hooks.
    pub fn transition(
        mut self,
        name: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.transitions.push(TransitionSpec::new(name, from, to));
        self
    }

    /// Add a fully specified transition.
    pub fn transition_spec(mut self, spec: TransitionSpec) -> Self {
        self.transitions.push(spec);
        self
    }

    /// Add multiple transitions at once.
    pub fn transitions(mut self, specs: Vec<TransitionSpec>) -> Self {
        self.transitions.extend(specs);
        self
    }

    /// Hooks to run whenever any state becomes current (phase 8).
    pub fn before_each_state(mut self, hooks: impl Into<HookList>) -> Self {
        self.before_each_state.0.extend(hooks.into().0);
        self
    }

    /// Hooks to run whenever any state stops being current (phase 1).
    pub fn after_each_state(mut self, hooks: impl Into<HookList>) -> Self {
        self.after_each_state.0.extend(hooks.into().0);
        self
    }

    /// Hooks to run before any transition's pointer swap (phase 3).
    pub fn before_each_transition(mut self, hooks: impl Into<HookList>) -> Self {
        self.before_each_transition.0.extend(hooks.into().0);
        self
    }

    /// Hooks to run after any transition's pointer swap (phase 6).
    pub fn after_each_transition(mut self, hooks: impl Into<HookList>) -> Self {
        self.after_each_transition.0.extend(hooks.into().0);
        self
    }

    /// Replace the configuration wholesale.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Shorthand for setting the per-hook timeout on the configuration.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Build the state machine.
    ///
    /// Fails with [`BuildError::MissingInitialState`] or
    /// [`BuildError::NoStates`] when required pieces are absent, and wraps
    /// any graph validation failure from [`StateMachine::new`].
    pub fn build(self) -> Result<StateMachine, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        if self.states.is_empty() {
            return Err(BuildError::NoStates);
        }

        let states = StatesSpec::new(self.states)
            .before(self.before_each_state)
            .after(self.after_each_state);
        let transitions = TransitionsSpec::new(self.transitions)
            .before(self.before_each_transition)
            .after(self.after_each_transition);

        Ok(StateMachine::new(initial, states, transitions, self.config)?)
    }
}
