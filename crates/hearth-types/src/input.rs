//! Request and response bodies of the input RPC.

use serde::{Deserialize, Serialize};

use crate::event::RoomEvent;

/// How the input step should treat an incoming room event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Stored for reference only; not part of the room's visible timeline.
    Outlier,
    /// A new event at the forward extremity of the room.
    #[default]
    New,
    /// A historical event backfilled behind the current timeline.
    Old,
}

/// A room event submitted for processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRoomEvent {
    #[serde(default)]
    pub kind: InputKind,
    pub event: RoomEvent,
    /// Server name to attribute a locally originated send to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_as_server: Option<String>,
}

/// An invite received for a room this server may not participate in yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputInviteEvent {
    pub room_version: String,
    pub event: RoomEvent,
}

/// A batch of events to apply, room events first then invites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRoomEventsRequest {
    #[serde(default)]
    pub input_room_events: Vec<InputRoomEvent>,
    #[serde(default)]
    pub input_invite_events: Vec<InputInviteEvent>,
}

/// Successful reply to an input batch. Carries no fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRoomEventsResponse {}
