use hearth_types::{InputInviteEvent, InputRoomEvent, RequestContext};

use crate::error::ProcessError;

/// Applies a single input event.
///
/// A processor computes the event's effect on room state, persists it and
/// publishes the resulting output events, all as side effects. It must be
/// safe to call again with an event it has already applied.
pub trait EventProcessor: Send + Sync {
    fn process_room_event(
        &self,
        ctx: &RequestContext,
        input: &InputRoomEvent,
    ) -> Result<(), ProcessError>;

    fn process_invite_event(
        &self,
        ctx: &RequestContext,
        input: &InputInviteEvent,
    ) -> Result<(), ProcessError>;
}
