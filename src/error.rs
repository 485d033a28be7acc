//! Error types for the snippet sandbox.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while running a snippet.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// The source referenced a restricted host capability and was never run.
    #[error("Security error: Attempt to use restricted operations.")]
    SecurityViolation {
        /// The first restricted identifier found in the source.
        identifier: String,
    },

    /// The execution did not settle before the wall-clock deadline.
    #[error("Execution timed out after {} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    /// Failed to prepare the engine context for an execution.
    #[error("failed to initialize runtime: {0}")]
    RuntimeInit(#[source] anyhow::Error),

    /// The execution worker went away without reporting an outcome.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error, e.g. the worker thread could not be spawned.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SandboxError {
    /// Check if this error represents a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SandboxError::Timeout(_))
    }

    /// Check if this error represents a rejected, restricted source.
    pub fn is_security_violation(&self) -> bool {
        matches!(self, SandboxError::SecurityViolation { .. })
    }

    /// Whether this error is part of the result protocol rather than an
    /// internal failure.
    ///
    /// Security violations and timeouts are expected outcomes of running
    /// untrusted code and are shown to the user verbatim.
    pub fn is_reportable(&self) -> bool {
        self.is_timeout() || self.is_security_violation()
    }
}

/// Result type alias for sandbox operations.
pub type Result<T> = std::result::Result<T, SandboxError>;
