//! Engine configuration.

use crate::error::StateMachineError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Custom error observer installed via [`Config::with_error_handler`].
///
/// The handler sees every error before it is returned to the caller. It may
/// substitute a different error by returning `Some(replacement)`; returning
/// `None` lets the original propagate. It cannot suppress errors.
pub type ErrorHandler =
    Arc<dyn Fn(&StateMachineError) -> Option<StateMachineError> + Send + Sync>;

/// Configuration accepted at machine construction.
#[derive(Clone, Default)]
pub struct Config {
    timeout: Option<Duration>,
    on_error: Option<ErrorHandler>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Race every hook against this duration. A hook that does not settle in
    /// time fails the operation with [`StateMachineError::Timeout`].
    ///
    /// Without a timeout a hook that never settles stalls the pipeline
    /// indefinitely; that is documented behavior, not a defect.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Install a custom error handler that observes every reported error and
    /// may replace it with a different one.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&StateMachineError) -> Option<StateMachineError> + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The single error exit. Every fallible check routes its error through
    /// here so the configured handler sees it first.
    pub(crate) fn report(&self, error: StateMachineError) -> StateMachineError {
        if let Some(handler) = &self.on_error {
            if let Some(replacement) = handler(&error) {
                return replacement;
            }
        }
        error
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("timeout", &self.timeout)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_returns_original_without_handler() {
        let config = Config::new();
        let error = config.report(StateMachineError::PendingState);
        assert_eq!(error, StateMachineError::PendingState);
    }

    #[test]
    fn report_lets_handler_observe_without_replacing() {
        let config = Config::new().with_error_handler(|_| None);
        let error = config.report(StateMachineError::Timeout);
        assert_eq!(error, StateMachineError::Timeout);
    }

    #[test]
    fn report_propagates_handler_replacement() {
        let config = Config::new().with_error_handler(|original| {
            assert_eq!(original, &StateMachineError::PendingState);
            Some(StateMachineError::Timeout)
        });
        let error = config.report(StateMachineError::PendingState);
        assert_eq!(error, StateMachineError::Timeout);
    }
}
