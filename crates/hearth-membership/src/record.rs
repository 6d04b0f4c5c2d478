use hearth_types::{Membership, StreamPosition, TopologicalPosition};
use serde::Serialize;

/// A single row from the `room_memberships` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipRecord {
    pub room_id: String,
    pub user_id: String,
    pub membership: Membership,
    /// The event that most recently moved the user into `membership`.
    pub event_id: String,
    pub stream_pos: StreamPosition,
    pub topological_pos: TopologicalPosition,
}
