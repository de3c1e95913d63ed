//! Snapshot of a machine's externally visible state.
//!
//! A [`HydratedState`] is a deep, disconnected value copy of the current
//! state name, that state's data, and the transport bag. The engine does not
//! persist it; callers store it wherever they like (it serializes with
//! serde) and hand it back to [`StateMachine::hydrate`] later.
//!
//! A snapshot is not state-machine-aware: restoring one whose state name is
//! unknown to the target machine fails with `AbsentState`.
//!
//! [`StateMachine::hydrate`]: crate::machine::StateMachine::hydrate

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{ state, data, transport }`, structurally independent of the machine
/// that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HydratedState {
    /// Name of the state that was current when the snapshot was taken.
    pub state: String,

    /// That state's payload data.
    pub data: Value,

    /// The transport bag's contents.
    pub transport: Map<String, Value>,
}
