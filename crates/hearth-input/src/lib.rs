//! Room event input for Hearth.
//!
//! [`InputPipeline`] is the entry point for batches of new room events and
//! invites. It hands each event, in order, to an [`EventProcessor`] that
//! decides what the event means, persists it and publishes the results.
//!
//! # Batch semantics
//!
//! Room events are applied first, then invites, strictly one at a time. The
//! first failure stops the batch and is returned as [`InputError::Failed`],
//! naming the pass, index and event id that failed. Events applied before
//! the failure keep their effects: their membership updates are committed
//! and their output events are already on the stream. The contract is
//! at-least-once with partial progress, so callers retry the remainder and
//! processors must tolerate re-delivery.
//!
//! # Default processor
//!
//! [`RoomEventWriter`] is the bundled processor. Per event it:
//!
//! 1. stores the event in `room_events`, assigning its stream position
//!    (a re-delivered event keeps its original position),
//! 2. records membership transitions via `hearth-membership`, in the same
//!    transaction,
//! 3. commits, then publishes the derived output events for the room.
//!
//! It does no authorization and no state resolution.

mod error;
mod events;
mod pipeline;
mod processor;
mod writer;

pub use error::{InputError, InputPass, ProcessError};
pub use pipeline::InputPipeline;
pub use processor::EventProcessor;
pub use writer::{PurgeSummary, RoomEventWriter};
