//! Error types for the state machine engine.
//!
//! Every failure carries a machine-readable [`ErrorCode`] next to its human
//! message, so callers can match on `error.code()` instead of parsing text.

use std::fmt;
use thiserror::Error;

/// Errors produced by construction, queries, transitions, and hydration.
///
/// Construction-time validation failures are fatal: no machine instance is
/// returned. Runtime failures never corrupt the machine — a failed
/// transition leaves the current state exactly where it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMachineError {
    /// A guarded operation was invoked while another one was in flight.
    #[error("state machine is in pending state")]
    PendingState,

    /// The named state is not declared on this machine.
    #[error("state \"{name}\" does not exist")]
    AbsentState { name: String },

    /// The target state exists but no transition leads there from the
    /// current state.
    #[error("state machine cannot transit from \"{from}\" to \"{to}\"")]
    UnavailableState { from: String, to: String },

    /// Two declared states share a name.
    #[error("there are duplicated states \"{name}\"")]
    DuplicatedState { name: String },

    /// The named transition is not declared on this machine.
    #[error("transition \"{name}\" does not exist")]
    AbsentTransition { name: String },

    /// The transition exists but its `from` is not the current state.
    #[error("state machine cannot do transition \"{name}\" from \"{from}\"")]
    UnavailableTransition { name: String, from: String },

    /// Two declared transitions share both `from` and name.
    #[error("there are duplicated transitions \"{name}\" from \"{from}\" state")]
    DuplicatedTransition { name: String, from: String },

    /// A hook did not settle within the configured timeout.
    #[error("hook execution timed out")]
    Timeout,
}

impl StateMachineError {
    /// The machine-readable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PendingState => ErrorCode::PendingState,
            Self::AbsentState { .. } => ErrorCode::AbsentState,
            Self::UnavailableState { .. } => ErrorCode::UnavailableState,
            Self::DuplicatedState { .. } => ErrorCode::DuplicatedState,
            Self::AbsentTransition { .. } => ErrorCode::AbsentTransition,
            Self::UnavailableTransition { .. } => ErrorCode::UnavailableTransition,
            Self::DuplicatedTransition { .. } => ErrorCode::DuplicatedTransition,
            Self::Timeout => ErrorCode::Timeout,
        }
    }
}

/// Flat machine-readable error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    PendingState,
    AbsentState,
    UnavailableState,
    DuplicatedState,
    AbsentTransition,
    UnavailableTransition,
    DuplicatedTransition,
    Timeout,
}

impl ErrorCode {
    /// Stable string form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingState => "PENDING_STATE",
            Self::AbsentState => "ABSENT_STATE",
            Self::UnavailableState => "UNAVAILABLE_STATE",
            Self::DuplicatedState => "DUPLICATED_STATE",
            Self::AbsentTransition => "ABSENT_TRANSITION",
            Self::UnavailableTransition => "UNAVAILABLE_TRANSITION",
            Self::DuplicatedTransition => "DUPLICATED_TRANSITION",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_exposes_machine_readable_code() {
        let error = StateMachineError::AbsentState {
            name: "PLASMA".to_string(),
        };
        assert_eq!(error.code(), ErrorCode::AbsentState);
        assert_eq!(error.code().as_str(), "ABSENT_STATE");
    }

    #[test]
    fn error_message_names_the_offender() {
        let error = StateMachineError::UnavailableTransition {
            name: "CONDENSE".to_string(),
            from: "LIQUID".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "state machine cannot do transition \"CONDENSE\" from \"LIQUID\""
        );
    }

    #[test]
    fn codes_are_distinct() {
        let codes = [
            ErrorCode::PendingState,
            ErrorCode::AbsentState,
            ErrorCode::UnavailableState,
            ErrorCode::DuplicatedState,
            ErrorCode::AbsentTransition,
            ErrorCode::UnavailableTransition,
            ErrorCode::DuplicatedTransition,
            ErrorCode::Timeout,
        ];
        let unique: std::collections::HashSet<&str> =
            codes.iter().map(|c| c.as_str()).collect();
        assert_eq!(unique.len(), codes.len());
    }
}
