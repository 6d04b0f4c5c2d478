//! Error types for output publishing.

use hearth_types::ContextError;

/// Errors raised by a stream transport.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The producer was closed and accepts no more sends.
    #[error("output stream producer is closed")]
    Closed,

    /// The transport refused the batch.
    #[error("output stream rejected batch: {0}")]
    Rejected(String),

    /// A database operation failed.
    #[error("output stream database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No connection could be taken from the pool.
    #[error("output stream connection error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Message headers could not be encoded or decoded.
    #[error("output stream header encoding error: {0}")]
    Headers(#[from] serde_json::Error),

    /// The request was cancelled or ran past its deadline.
    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Errors returned by [`OutputPublisher`](crate::OutputPublisher).
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// An output event could not be serialised.
    #[error("failed to serialize output event: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The batch was not acknowledged. No partial-success detail is kept.
    #[error("failed to send output events: {0}")]
    Transport(#[from] StreamError),

    /// The request was cancelled or ran past its deadline.
    #[error(transparent)]
    Context(#[from] ContextError),
}
