//! Error types for the Leibniz core.

use thiserror::Error;

/// The main error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The target event loop has already exited (or was never running).
    #[error("The event loop has already exited")]
    LoopExited,
    /// Timer-related error.
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),
    /// Signal-related error.
    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),
    /// The operating system refused to spawn a worker thread.
    #[error("Failed to spawn worker thread: {0}")]
    WorkerSpawn(String),
}

/// Timer-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// The timer ID is invalid or has already been removed.
    #[error("Invalid or expired timer ID")]
    InvalidTimerId,
}

/// Signal-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// The connection ID is invalid or has already been disconnected.
    #[error("Invalid or disconnected connection ID")]
    InvalidConnection,
}

/// A specialized Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_display() {
        let err: CoreError = TimerError::InvalidTimerId.into();
        assert_eq!(err.to_string(), "Timer error: Invalid or expired timer ID");

        let err: CoreError = SignalError::InvalidConnection.into();
        assert!(err.to_string().contains("connection ID"));
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;

        let err = CoreError::from(TimerError::InvalidTimerId);
        assert!(err.source().is_some());
        assert!(CoreError::LoopExited.source().is_none());
    }
}
