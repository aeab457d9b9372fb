//! Observability error types.

/// Result type alias for observe operations.
pub type Result<T> = std::result::Result<T, ObserveError>;

/// Observability errors.
#[derive(Debug, thiserror::Error)]
pub enum ObserveError {
    /// Every sender of a transition feed was dropped.
    #[error("transition feed closed")]
    FeedClosed,

    /// A subscriber fell behind and missed events.
    #[error("transition feed lagged, {0} events dropped")]
    Lagged(u64),

    /// Report serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
