//! Phasic: an embeddable asynchronous finite-state-machine engine.
//!
//! A machine is a validated graph of named states and named, directed
//! transitions. Every mutation runs an eight-phase pipeline of async hooks
//! that can observe, enrich, or veto the change; a veto (or a failure) after
//! the state pointer has moved rolls it back, so observers only ever see
//! committed states. One guarded operation runs at a time per machine, and
//! the whole live position can be dehydrated to a serializable snapshot and
//! hydrated back later.
//!
//! # Core Concepts
//!
//! - **States and transitions**: declared up front via [`StateSpec`] and
//!   [`TransitionSpec`], validated as a graph at construction
//! - **Hooks**: async callbacks attached to states, transitions, or the
//!   machine as a whole, run serially in a fixed phase order
//! - **Transport**: a shared key-value bag every hook can read and write,
//!   carried across transitions and captured by snapshots
//! - **Snapshots**: [`HydratedState`] freezes the current state, its
//!   payload, and the transport for storage or transfer
//!
//! # Example
//!
//! ```rust
//! use phasic::{Config, StateMachine, StateSpec, TransitionSpec};
//! use serde_json::json;
//!
//! let machine = StateMachine::new(
//!     "SOLID",
//!     vec![
//!         StateSpec::new("SOLID", json!({ "temperature": -100 })),
//!         StateSpec::new("LIQUID", json!({ "temperature": 50 })),
//!         StateSpec::new("GAS", json!({ "temperature": 200 })),
//!     ],
//!     vec![
//!         TransitionSpec::new("MELT", "SOLID", "LIQUID"),
//!         TransitionSpec::new("VAPORIZE", "LIQUID", "GAS"),
//!         TransitionSpec::new("CONDENSE", "GAS", "LIQUID"),
//!         TransitionSpec::new("FREEZE", "LIQUID", "SOLID"),
//!     ],
//!     Config::default(),
//! )?;
//!
//! assert_eq!(machine.state(), "SOLID");
//! assert_eq!(machine.states(), ["LIQUID"]);
//! assert_eq!(machine.transitions(), ["MELT"]);
//! # Ok::<(), phasic::StateMachineError>(())
//! ```
//!
//! Transitions themselves are async: `machine.transit_to("LIQUID").await?`
//! moves by target state name, `machine.do_transition("MELT").await?` by
//! transition name.

pub mod builder;
pub mod config;
pub mod core;
pub mod error;
pub mod machine;
pub mod snapshot;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder};
pub use config::{Config, ErrorHandler};
pub use core::graph::{StateSpec, StatesSpec, TransitionSpec, TransitionsSpec};
pub use core::hook::{hook, observer, Hook, HookContext, HookList, Transport};
pub use core::source::Source;
pub use error::{ErrorCode, StateMachineError};
pub use machine::StateMachine;
pub use snapshot::HydratedState;
