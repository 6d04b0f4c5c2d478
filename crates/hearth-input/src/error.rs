//! Error types for room event input.

use hearth_membership::MembershipError;
use hearth_output::PublishError;
use hearth_types::{ContextError, EventError, Membership};

/// Errors an [`EventProcessor`](crate::EventProcessor) can return for one event.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// The event cannot be interpreted.
    #[error("malformed event: {0}")]
    MalformedEvent(#[from] EventError),

    /// An invite input carried a membership other than `invite`.
    #[error("invite event {event_id} has membership {membership}")]
    NotAnInvite {
        event_id: String,
        membership: Membership,
    },

    /// The processor refused the event.
    #[error("event rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Membership(#[from] MembershipError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Reading or writing `room_events` failed.
    #[error("room event store error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database connection error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The event could not be encoded for storage.
    #[error("failed to encode event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Which half of an input batch an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPass {
    Room,
    Invite,
}

impl std::fmt::Display for InputPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Room => f.write_str("room event"),
            Self::Invite => f.write_str("invite event"),
        }
    }
}

/// A batch stopped at its first failing event.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// Events before `index` in `pass` (and, for the invite pass, every room
    /// event) were applied and are not rolled back.
    #[error("{pass} {index} ({event_id}) failed: {source}")]
    Failed {
        pass: InputPass,
        index: usize,
        event_id: String,
        source: ProcessError,
    },
}
