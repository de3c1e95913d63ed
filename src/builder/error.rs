//! Build errors for the state machine builder.

use crate::error::StateMachineError;
use thiserror::Error;

/// Errors that can occur when assembling a machine through the builder.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(name) before .build()")]
    MissingInitialState,

    #[error("No states defined. Add at least one state")]
    NoStates,

    /// Graph validation or initial-state resolution failed.
    #[error(transparent)]
    Machine(#[from] StateMachineError),
}
