//! Error types for Spectrum Virtualize cfgmgr operations.
//!
//! The taxonomy mirrors the three ways a reconciliation can stop:
//! bad input (no remote call made), an unreachable or unauthenticated
//! cluster (no mutation attempted), or a rejected mutation. All errors
//! implement `std::error::Error` via `thiserror`.

use std::io;
use thiserror::Error;

/// Result type alias for cfgmgr operations.
pub type SvcResult<T> = Result<T, SvcError>;

/// Errors that can occur during cfgmgr operations.
#[derive(Debug, Error)]
pub enum SvcError {
    /// Desired state rejected before any remote call.
    #[error("Invalid parameter {field}: {message}")]
    Validation {
        /// The offending parameter.
        field: String,
        /// Human-readable reason.
        message: String,
    },

    /// Cluster unreachable or authentication failed.
    #[error("Transport failure talking to {target}: {message}")]
    Transport {
        /// Endpoint or host that was contacted.
        target: String,
        /// Error message.
        message: String,
    },

    /// The cluster rejected a command.
    #[error("Command '{command}' failed: {message}")]
    Operation {
        /// The rendered command.
        command: String,
        /// Error message returned by the cluster.
        message: String,
    },

    /// The local ssh helper could not be spawned or did not finish in time.
    #[error("Failed to execute shell command '{command}': {source}")]
    ShellExec {
        /// The command that failed to execute.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Configuration file or value is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },
}

impl SvcError {
    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Creates an operation error.
    pub fn operation(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Operation {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Re-labels a failure of a mutating command as an operation error.
    ///
    /// Once a mutation has been sent the outcome on the cluster is unknown,
    /// so connectivity failures at that point are reported the same way as
    /// an outright rejection.
    pub fn into_operation(self, command: &str) -> Self {
        match self {
            SvcError::Transport { target, message } => SvcError::Operation {
                command: command.to_string(),
                message: format!("{}: {}", target, message),
            },
            SvcError::ShellExec { source, .. } => SvcError::Operation {
                command: command.to_string(),
                message: source.to_string(),
            },
            other => other,
        }
    }

    /// Short machine-readable class name used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SvcError::Validation { .. } => "validation",
            SvcError::Transport { .. } | SvcError::ShellExec { .. } => "transport",
            SvcError::Operation { .. } => "operation",
            SvcError::Config { .. } => "config",
        }
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed when the caller re-runs reconciliation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SvcError::Transport { .. } | SvcError::ShellExec { .. }
        )
    }
}
