//! Test error types.

/// Result type alias for test operations.
pub type Result<T> = std::result::Result<T, TestError>;

/// Testing errors.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// Harness error.
    #[error("harness error: {0}")]
    Harness(String),

    /// Load test error.
    #[error("load test error: {0}")]
    LoadTest(String),

    /// Assertion failed.
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// Breaker configuration error.
    #[error("config error: {0}")]
    Config(#[from] tripwire_core::ConfigError),

    /// Observability error.
    #[error("observe error: {0}")]
    Observe(#[from] tripwire_observe::ObserveError),
}

impl TestError {
    /// Creates a harness error.
    #[must_use]
    pub fn harness(msg: impl Into<String>) -> Self {
        Self::Harness(msg.into())
    }

    /// Creates an assertion error.
    #[must_use]
    pub fn assertion(msg: impl Into<String>) -> Self {
        Self::Assertion(msg.into())
    }
}
