//! Error types for the membership history store.

use hearth_types::{ContextError, EventError};

/// Errors that can occur during membership history operations.
#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    /// The event does not carry a resolvable membership or subject.
    #[error("malformed membership event: {0}")]
    MalformedEvent(#[from] EventError),

    /// A database operation failed.
    #[error("membership database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The request was cancelled or ran past its deadline.
    #[error(transparent)]
    Context(#[from] ContextError),
}
