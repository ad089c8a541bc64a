//! Error types for the application.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// A failed call against the Discord API, already classified.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Discord reported its gateway as unavailable. Worth retrying.
    #[error("Discord temporarily unavailable: {message}")]
    Transient { message: String },

    /// Anything else. Not worth retrying.
    #[error("Discord request failed: {message}")]
    Fatal { message: String },
}

impl TransportError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Outcome of a call that went through the retry policy and did not succeed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("Unrecoverable Discord error: {message}")]
    Fatal { message: String },

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetryExhausted {
        attempts: usize,
        last_error: TransportError,
    },
}

/// Destination resolution errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No primary text channel found")]
    NoPrimaryChannelFound,

    #[error(transparent)]
    Call(#[from] CallError),
}

/// Errors surfaced by the engine to the dispatch loop.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The process must stop. Carries the diagnostic to log before exiting.
    #[error("Fatal: {message}")]
    Fatal { message: String },
}

impl AgentError {
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }
}

/// Result type alias for transport calls.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Result type alias for calls made through the retry policy.
pub type CallResult<T> = std::result::Result<T, CallError>;
