//! Membership history for Hearth rooms.
//!
//! Records, per room, user and membership state, the most recent event that
//! moved the user into that state together with its stream and topological
//! positions. This is the data history-visibility checks need: "when did
//! this user last join, leave or get banned from this room?"
//!
//! # Semantics
//!
//! - At most one row exists per (room, user, membership). Entering a state
//!   again overwrites the row, so intermediate re-entries are not
//!   recoverable. The table is a most-recent index, not an audit log.
//! - [`upsert_membership`] takes the caller's [`rusqlite::Transaction`] so the
//!   write commits or rolls back together with whatever else the caller is
//!   changing.
//! - [`select_membership`] returns `Ok(None)` when nothing matches. Not-found
//!   is an expected answer, never an error.
//! - [`latest_topological_position`] tells a backfill writer whether the
//!   index already knows a topologically later state for the user.
//! - [`purge_room`] drops every row for a room.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hearth_membership::{select_membership, upsert_membership};
//! use hearth_types::Membership;
//!
//! let txn = conn.transaction()?;
//! upsert_membership(&txn, &ctx, &event, stream_pos, event.topological_position())?;
//! txn.commit()?;
//!
//! let last = select_membership(&conn, &ctx, room_id, user_id, &[Membership::Join, Membership::Leave])?;
//! ```

mod error;
mod record;
mod store;

pub use error::MembershipError;
pub use record::MembershipRecord;
pub use store::{
    latest_topological_position, purge_room, select_membership, upsert_membership,
};
