//! The room event model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::membership::Membership;
use crate::position::TopologicalPosition;

/// Event type of a membership state event.
pub const MEMBER_EVENT_TYPE: &str = "m.room.member";

/// Event type of a redaction.
pub const REDACTION_EVENT_TYPE: &str = "m.room.redaction";

/// A single event in a room's history.
///
/// The core does not validate signatures, auth chains or content schemas.
/// It only reads the fields needed to route, order and index the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEvent {
    /// Globally unique event identifier.
    pub event_id: String,
    /// The room this event belongs to.
    pub room_id: String,
    /// The user who sent the event.
    pub sender: String,
    /// Event type, e.g. `m.room.member`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Present on state events. For membership events this is the subject user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,
    /// Event content as sent by the client.
    #[serde(default)]
    pub content: serde_json::Value,
    /// Depth in the room graph.
    #[serde(default)]
    pub depth: i64,
    /// Events this one references as its parents.
    #[serde(default)]
    pub prev_events: Vec<String>,
    /// Origin timestamp in milliseconds since the epoch.
    #[serde(default)]
    pub origin_server_ts: i64,
    /// For redactions, the event being redacted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redacts: Option<String>,
}

/// Reasons an event cannot be interpreted the way a caller needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("event {event_id} has type {event_type}, not m.room.member")]
    NotMembershipEvent { event_id: String, event_type: String },
    #[error("event {0} has no content.membership")]
    MissingMembership(String),
    #[error("event {event_id} has unknown membership {value:?}")]
    UnknownMembership { event_id: String, value: String },
    #[error("event {0} has no state key")]
    MissingStateKey(String),
}

impl RoomEvent {
    /// Returns true if this is a state event.
    pub fn is_state(&self) -> bool {
        self.state_key.is_some()
    }

    /// Returns true if this is an `m.room.member` event.
    pub fn is_membership(&self) -> bool {
        self.event_type == MEMBER_EVENT_TYPE
    }

    /// Resolves the membership state carried by an `m.room.member` event.
    pub fn membership(&self) -> Result<Membership, EventError> {
        if !self.is_membership() {
            return Err(EventError::NotMembershipEvent {
                event_id: self.event_id.clone(),
                event_type: self.event_type.clone(),
            });
        }
        let value = self
            .content
            .get("membership")
            .and_then(|v| v.as_str())
            .ok_or_else(|| EventError::MissingMembership(self.event_id.clone()))?;
        value.parse().map_err(|_| EventError::UnknownMembership {
            event_id: self.event_id.clone(),
            value: value.to_string(),
        })
    }

    /// The user whose membership this event changes (its state key).
    pub fn membership_subject(&self) -> Result<&str, EventError> {
        self.state_key
            .as_deref()
            .ok_or_else(|| EventError::MissingStateKey(self.event_id.clone()))
    }

    /// The event's topological position, taken from its depth.
    pub fn topological_position(&self) -> TopologicalPosition {
        TopologicalPosition(self.depth)
    }

    /// For a redaction, the id of the redacted event.
    ///
    /// Older room versions carry it at the top level, newer ones in content.
    pub fn redacted_event_id(&self) -> Option<&str> {
        if self.event_type != REDACTION_EVENT_TYPE {
            return None;
        }
        self.redacts
            .as_deref()
            .or_else(|| self.content.get("redacts").and_then(|v| v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn member_event(content: serde_json::Value, state_key: Option<&str>) -> RoomEvent {
        RoomEvent {
            event_id: "$e1".to_string(),
            room_id: "!room:example.org".to_string(),
            sender: "@alice:example.org".to_string(),
            event_type: MEMBER_EVENT_TYPE.to_string(),
            state_key: state_key.map(str::to_string),
            content,
            depth: 3,
            prev_events: vec![],
            origin_server_ts: 0,
            redacts: None,
        }
    }

    #[test]
    fn membership_resolves_from_content() {
        let event = member_event(json!({"membership": "join"}), Some("@alice:example.org"));
        assert_eq!(event.membership().unwrap(), Membership::Join);
        assert_eq!(event.membership_subject().unwrap(), "@alice:example.org");
        assert_eq!(event.topological_position(), TopologicalPosition(3));
    }

    #[test]
    fn membership_errors_are_specific() {
        let missing = member_event(json!({}), Some("@a:x"));
        assert!(matches!(
            missing.membership(),
            Err(EventError::MissingMembership(_))
        ));

        let unknown = member_event(json!({"membership": "lurk"}), Some("@a:x"));
        assert!(matches!(
            unknown.membership(),
            Err(EventError::UnknownMembership { ref value, .. }) if value == "lurk"
        ));

        let no_subject = member_event(json!({"membership": "join"}), None);
        assert!(matches!(
            no_subject.membership_subject(),
            Err(EventError::MissingStateKey(_))
        ));

        let mut message = member_event(json!({"body": "hi"}), None);
        message.event_type = "m.room.message".to_string();
        assert!(matches!(
            message.membership(),
            Err(EventError::NotMembershipEvent { .. })
        ));
    }

    #[test]
    fn redaction_target_is_read_from_either_location() {
        let mut event = member_event(json!({"redacts": "$target"}), None);
        event.event_type = REDACTION_EVENT_TYPE.to_string();
        assert_eq!(event.redacted_event_id(), Some("$target"));

        event.redacts = Some("$top".to_string());
        assert_eq!(event.redacted_event_id(), Some("$top"));
    }

    #[test]
    fn deserializes_minimal_wire_form() {
        let event: RoomEvent = serde_json::from_value(json!({
            "event_id": "$m",
            "room_id": "!r:x",
            "sender": "@s:x",
            "type": "m.room.message"
        }))
        .unwrap();
        assert!(!event.is_state());
        assert_eq!(event.depth, 0);
        assert!(event.content.is_null());
    }
}
