//! Shared types for the Hearth room-event core.
//!
//! This crate holds the vocabulary every other Hearth crate speaks: room
//! events and their membership semantics, stream and topological positions,
//! the input RPC request types, the polymorphic [`OutputEvent`] envelope,
//! and the [`RequestContext`] that carries trace identity, deadline and
//! cancellation through every call.
//!
//! No crate in the workspace depends on another for cross-cutting type
//! definitions except `hearth-types`. It carries no database or runtime
//! dependencies.

mod context;
mod event;
mod input;
mod membership;
mod output;
mod position;

pub use context::{CancelOnDrop, ContextError, RequestContext, TraceContext, TRACEPARENT_HEADER};
pub use event::{EventError, RoomEvent, MEMBER_EVENT_TYPE, REDACTION_EVENT_TYPE};
pub use input::{InputInviteEvent, InputKind, InputRoomEvent, InputRoomEventsRequest, InputRoomEventsResponse};
pub use membership::{Membership, ParseMembershipError};
pub use output::OutputEvent;
pub use position::{StreamPosition, TopologicalPosition};
