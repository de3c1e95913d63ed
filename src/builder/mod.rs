//! Builder API for ergonomic state machine construction.
//!
//! [`StateMachineBuilder`] assembles states, transitions, machine-wide
//! each-hooks, and configuration one call at a time, then validates the
//! whole graph on `build()`.

pub mod error;
pub mod machine;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
