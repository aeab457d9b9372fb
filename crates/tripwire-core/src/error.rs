//! Error types for tripwire-core.
//!
//! The breaker never swallows an operation's error: it is handed back
//! unchanged inside [`BreakerError::Operation`]. The remaining variants are
//! the breaker's own rejections.

use crate::context::ContextError;

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Error returned by a guarded call.
///
/// `E` is the error type of the wrapped operation.
#[derive(Debug, thiserror::Error)]
pub enum BreakerError<E> {
    /// The supplied context was already done; the operation never ran.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Circuit is open; the operation never ran. Do not retry immediately.
    #[error("circuit breaker is open")]
    Open,

    /// Reserved for a half-open concurrency cap. The admission policy never
    /// produces it.
    #[error("too many requests in half-open state")]
    TooManyRequests,

    /// The operation ran and returned this error.
    #[error(transparent)]
    Operation(E),
}

impl<E> BreakerError<E> {
    /// Returns true if the breaker itself rejected the call.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Open | Self::TooManyRequests)
    }

    /// Returns true if the context was done before admission.
    #[must_use]
    pub const fn is_context(&self) -> bool {
        matches!(self, Self::Context(_))
    }

    /// Returns the operation's error, if the operation ran and failed.
    #[must_use]
    pub const fn operation(&self) -> Option<&E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }

    /// Consumes the error, returning the operation's error if there is one.
    #[must_use]
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            _ => None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Settings file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings could not be parsed.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings parsed but are invalid.
    #[error("invalid settings: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Creates an invalid-settings error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
