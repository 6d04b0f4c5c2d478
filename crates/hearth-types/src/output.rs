//! The polymorphic output envelope published for downstream consumers.

use serde::{Deserialize, Serialize};

use crate::event::RoomEvent;
use crate::membership::Membership;
use crate::position::StreamPosition;

/// An event published on the output stream.
///
/// Serialised with a `type` tag so consumers can match exhaustively on the
/// variant without inspecting payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    /// A new event was added to the room's timeline.
    NewRoomEvent {
        /// The event itself.
        event: RoomEvent,
        /// State event ids that entered the room's current state.
        add_state_event_ids: Vec<String>,
        /// State event ids that were replaced by this event.
        remove_state_event_ids: Vec<String>,
        /// The stream position assigned to the event.
        stream_position: StreamPosition,
        /// Server the event was sent on behalf of, for local sends.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        send_as_server: Option<String>,
    },

    /// A user was invited to a room.
    NewInviteEvent {
        /// The invite membership event.
        event: RoomEvent,
        /// Version of the room the invite is for.
        room_version: String,
        /// The stream position assigned to the invite.
        stream_position: StreamPosition,
    },

    /// An outstanding invite no longer applies.
    RetireInviteEvent {
        /// The invite event being retired.
        event_id: String,
        /// The room of the invite.
        room_id: String,
        /// The invited user.
        target_user_id: String,
        /// The membership that replaced the invite.
        membership: Membership,
        /// The event that superseded the invite.
        retired_by_event_id: String,
    },

    /// An event was redacted.
    RedactedEvent {
        /// The event whose content was removed.
        redacted_event_id: String,
        /// The redaction event.
        redacted_because: RoomEvent,
    },

    /// All data for a room was purged.
    PurgeRoom {
        /// The purged room.
        room_id: String,
    },
}

impl OutputEvent {
    /// Returns the wire tag for this variant.
    pub fn output_type(&self) -> &'static str {
        match self {
            Self::NewRoomEvent { .. } => "new_room_event",
            Self::NewInviteEvent { .. } => "new_invite_event",
            Self::RetireInviteEvent { .. } => "retire_invite_event",
            Self::RedactedEvent { .. } => "redacted_event",
            Self::PurgeRoom { .. } => "purge_room",
        }
    }

    /// The room this output event belongs to.
    pub fn room_id(&self) -> &str {
        match self {
            Self::NewRoomEvent { event, .. } | Self::NewInviteEvent { event, .. } => &event.room_id,
            Self::RetireInviteEvent { room_id, .. } | Self::PurgeRoom { room_id } => room_id,
            Self::RedactedEvent {
                redacted_because, ..
            } => &redacted_because.room_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tag_matches_output_type() {
        let events = [
            OutputEvent::PurgeRoom {
                room_id: "!r:x".to_string(),
            },
            OutputEvent::RetireInviteEvent {
                event_id: "$i".to_string(),
                room_id: "!r:x".to_string(),
                target_user_id: "@u:x".to_string(),
                membership: Membership::Join,
                retired_by_event_id: "$j".to_string(),
            },
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.output_type());
            assert_eq!(event.room_id(), "!r:x");
        }
    }

    #[test]
    fn new_room_event_wire_shape() {
        let value = json!({
            "type": "new_room_event",
            "event": {
                "event_id": "$e",
                "room_id": "!r:x",
                "sender": "@s:x",
                "type": "m.room.message",
                "content": {"body": "hello"}
            },
            "add_state_event_ids": [],
            "remove_state_event_ids": [],
            "stream_position": 42
        });
        let parsed: OutputEvent = serde_json::from_value(value).unwrap();
        match parsed {
            OutputEvent::NewRoomEvent {
                stream_position,
                send_as_server,
                ref event,
                ..
            } => {
                assert_eq!(stream_position, StreamPosition(42));
                assert_eq!(send_as_server, None);
                assert_eq!(event.content["body"], "hello");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
