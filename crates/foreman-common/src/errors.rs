//! Error types for supervisor operations.
//!
//! Every failure at the supervisor boundary is converted into a
//! [`SupervisorError`]: a structured kind a caller can branch on, whose
//! `Display` text is the exact human-readable message the front-end
//! historically received. Callers that only care about the message can keep
//! formatting the error; callers that need to branch match on the variant.

use thiserror::Error;

/// Result type alias for supervisor operations.
pub type SupervisorResult<T> = std::result::Result<T, SupervisorError>;

/// Structured error for per-process supervisor operations.
///
/// The message text of each variant is part of the public contract: GUI
/// layers are known to substring-match on it, so it must stay stable even
/// though callers are encouraged to match on the variant instead.
#[derive(Debug, Error, Clone)]
pub enum SupervisorError {
    /// The name has never been registered.
    #[error("Process '{name}' not found")]
    NotFound { name: String },

    /// A start was issued while the record's running flag was already set.
    #[error("Process '{name}' is already running!")]
    AlreadyRunning { name: String },

    /// A stop was issued against an idle record (or one with no live handle).
    #[error("Process '{name}' is not running")]
    NotRunning { name: String },

    /// The OS refused to create the child (missing executable, permissions,
    /// or the supervisor is shutting down and refuses new children).
    #[error("Failed to start process '{name}': {reason}")]
    LaunchFailure { name: String, reason: String },

    /// A termination signal could not be delivered. The record's running
    /// flag is still forced false when this is returned from a stop path;
    /// see the supervisor docs for the rationale.
    #[error("Failed to kill process '{name}': {reason}")]
    SignalFailure { name: String, reason: String },

    /// Registration rejected the process name.
    #[error("Invalid process name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

impl SupervisorError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn already_running(name: impl Into<String>) -> Self {
        Self::AlreadyRunning { name: name.into() }
    }

    pub fn not_running(name: impl Into<String>) -> Self {
        Self::NotRunning { name: name.into() }
    }

    pub fn launch_failure(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LaunchFailure {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn signal_failure(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SignalFailure {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// The process name the failed operation was keyed by.
    pub fn name(&self) -> &str {
        match self {
            Self::NotFound { name }
            | Self::AlreadyRunning { name }
            | Self::NotRunning { name }
            | Self::LaunchFailure { name, .. }
            | Self::SignalFailure { name, .. }
            | Self::InvalidName { name, .. } => name,
        }
    }
}
