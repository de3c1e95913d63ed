//! Property-based tests for graph validation, legality queries, and
//! snapshots.
//!
//! These tests use proptest to verify properties hold across many randomly
//! generated machine shapes.

use phasic::{Config, ErrorCode, HydratedState, StateMachine, StateMachineError, StateSpec, TransitionSpec};
use proptest::prelude::*;
use serde_json::json;

/// A machine shape: a state count and a list of `(from, to)` index pairs.
/// State names are `S0..Sn`, transition names `T0..Tm`, so names are unique
/// by construction and every shape passes validation.
fn machine_shape() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2..8usize).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n), 0..12),
        )
    })
}

fn state_specs(n: usize) -> Vec<StateSpec> {
    (0..n)
        .map(|i| StateSpec::new(format!("S{i}"), json!({ "index": i })))
        .collect()
}

fn transition_specs(edges: &[(usize, usize)]) -> Vec<TransitionSpec> {
    edges
        .iter()
        .enumerate()
        .map(|(j, (from, to))| TransitionSpec::new(format!("T{j}"), format!("S{from}"), format!("S{to}")))
        .collect()
}

fn build(n: usize, edges: &[(usize, usize)]) -> Result<StateMachine, StateMachineError> {
    StateMachine::new(
        "S0",
        state_specs(n),
        transition_specs(edges),
        Config::default(),
    )
}

proptest! {
    #[test]
    fn well_formed_graphs_always_build((n, edges) in machine_shape()) {
        let machine = build(n, &edges).unwrap();

        let expected_states: Vec<String> = (0..n).map(|i| format!("S{i}")).collect();
        let expected_transitions: Vec<String> =
            (0..edges.len()).map(|j| format!("T{j}")).collect();

        prop_assert_eq!(machine.all_states(), expected_states);
        prop_assert_eq!(machine.all_transitions(), expected_transitions);
        prop_assert_eq!(machine.state(), "S0");
    }

    #[test]
    fn reachability_follows_declaration_order((n, edges) in machine_shape()) {
        let machine = build(n, &edges).unwrap();

        let expected_states: Vec<String> = edges
            .iter()
            .filter(|(from, _)| *from == 0)
            .map(|(_, to)| format!("S{to}"))
            .collect();
        let expected_transitions: Vec<String> = edges
            .iter()
            .enumerate()
            .filter(|(_, (from, _))| *from == 0)
            .map(|(j, _)| format!("T{j}"))
            .collect();

        prop_assert_eq!(machine.states(), expected_states);
        prop_assert_eq!(machine.transitions(), expected_transitions);
    }

    #[test]
    fn duplicate_state_names_are_rejected(
        (n, edges) in machine_shape(),
        pick in 0..8usize,
    ) {
        let mut states = state_specs(n);
        states.push(StateSpec::new(format!("S{}", pick % n), json!(null)));

        let error = StateMachine::new(
            "S0",
            states,
            transition_specs(&edges),
            Config::default(),
        )
        .unwrap_err();

        prop_assert_eq!(error.code(), ErrorCode::DuplicatedState);
    }

    #[test]
    fn unknown_endpoints_are_rejected((n, edges) in machine_shape()) {
        let mut transitions = transition_specs(&edges);
        // `S{n}` is one past the last declared state.
        transitions.push(TransitionSpec::new("DANGLING", "S0", format!("S{n}")));

        let error = StateMachine::new(
            "S0",
            state_specs(n),
            transitions,
            Config::default(),
        )
        .unwrap_err();

        prop_assert_eq!(error.code(), ErrorCode::AbsentState);
    }

    #[test]
    fn duplicate_name_from_pairs_are_rejected(
        (n, edges) in (2..8usize).prop_flat_map(|n| {
            (Just(n), prop::collection::vec((0..n, 0..n), 1..12))
        }),
        pick in 0..12usize,
    ) {
        let mut transitions = transition_specs(&edges);
        let (from, _) = edges[pick % edges.len()];
        // Same name and source as an existing transition, different target.
        transitions.push(TransitionSpec::new(
            format!("T{}", pick % edges.len()),
            format!("S{from}"),
            "S1",
        ));

        let error = StateMachine::new(
            "S0",
            state_specs(n),
            transitions,
            Config::default(),
        )
        .unwrap_err();

        prop_assert_eq!(error.code(), ErrorCode::DuplicatedTransition);
    }

    #[test]
    fn snapshots_roundtrip_through_json((n, edges) in machine_shape()) {
        let machine = build(n, &edges).unwrap();
        let snapshot = machine.dehydrated();

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: HydratedState = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(snapshot, restored);
    }

    #[test]
    fn hydration_transfers_position_between_instances(
        (n, edges) in machine_shape(),
        pick in 0..8usize,
    ) {
        let source = build(n, &edges).unwrap();
        let mut snapshot = source.dehydrated();
        // Point the snapshot at an arbitrary declared state.
        snapshot.state = format!("S{}", pick % n);

        let target = build(n, &edges).unwrap();
        target.hydrate(snapshot.clone()).unwrap();

        prop_assert_eq!(target.state(), snapshot.state.clone());
        prop_assert_eq!(target.dehydrated(), snapshot);
    }
}
