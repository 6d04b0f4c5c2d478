//! Persistence operations for membership history.

use hearth_types::{Membership, RequestContext, RoomEvent, StreamPosition, TopologicalPosition};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

use crate::error::MembershipError;
use crate::record::MembershipRecord;

/// Records the membership transition carried by `event`.
///
/// Writes or overwrites the row keyed by (room, subject, membership) with the
/// event id and positions. A row already holding a higher stream position is
/// left alone, so a re-delivered older event cannot roll the index back.
///
/// # Errors
///
/// Returns `MembershipError::MalformedEvent` if the event is not a
/// membership event with a known membership and a state key; nothing is
/// written in that case. Returns `MembershipError::Database` on SQL failure.
pub fn upsert_membership(
    txn: &Transaction<'_>,
    ctx: &RequestContext,
    event: &RoomEvent,
    stream_pos: StreamPosition,
    topological_pos: TopologicalPosition,
) -> Result<(), MembershipError> {
    ctx.check()?;
    let membership = event.membership()?;
    let user_id = event.membership_subject()?;

    let changed = txn.execute(
        "INSERT INTO room_memberships
            (room_id, user_id, membership, event_id, stream_pos, topological_pos)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (room_id, user_id, membership) DO UPDATE SET
            event_id = excluded.event_id,
            stream_pos = excluded.stream_pos,
            topological_pos = excluded.topological_pos
         WHERE excluded.stream_pos >= room_memberships.stream_pos",
        params![
            event.room_id,
            user_id,
            membership.as_str(),
            event.event_id,
            stream_pos.0,
            topological_pos.0,
        ],
    )?;

    if changed == 0 {
        tracing::debug!(
            room_id = %event.room_id,
            user_id,
            membership = membership.as_str(),
            event_id = %event.event_id,
            stream_pos = stream_pos.0,
            "newer membership already recorded, keeping it"
        );
    } else {
        tracing::debug!(
            room_id = %event.room_id,
            user_id,
            membership = membership.as_str(),
            event_id = %event.event_id,
            stream_pos = stream_pos.0,
            "recorded membership transition"
        );
    }

    Ok(())
}

/// Returns the most recent record for the user among `candidates`.
///
/// "Most recent" means highest stream position. Returns `Ok(None)` when the
/// user never held any of the candidate states in this room, or when
/// `candidates` is empty.
///
/// # Errors
///
/// Returns `MembershipError::Database` on SQL failure.
pub fn select_membership(
    conn: &Connection,
    ctx: &RequestContext,
    room_id: &str,
    user_id: &str,
    candidates: &[Membership],
) -> Result<Option<MembershipRecord>, MembershipError> {
    ctx.check()?;
    if candidates.is_empty() {
        return Ok(None);
    }

    // One bound placeholder per candidate; nothing is interpolated.
    let placeholders = (0..candidates.len())
        .map(|i| format!("?{}", i + 3))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT room_id, user_id, membership, event_id, stream_pos, topological_pos
         FROM room_memberships
         WHERE room_id = ?1 AND user_id = ?2 AND membership IN ({placeholders})
         ORDER BY stream_pos DESC, topological_pos DESC
         LIMIT 1"
    );

    let labels: Vec<&'static str> = candidates.iter().map(|m| m.as_str()).collect();
    let mut values: Vec<&dyn rusqlite::types::ToSql> = Vec::with_capacity(labels.len() + 2);
    values.push(&room_id);
    values.push(&user_id);
    for label in &labels {
        values.push(label);
    }

    let record = conn
        .query_row(&sql, values.as_slice(), map_row_to_record)
        .optional()?;
    Ok(record)
}

/// Returns the highest topological position recorded for the user in this
/// room, across every membership state.
///
/// # Errors
///
/// Returns `MembershipError::Database` on SQL failure.
pub fn latest_topological_position(
    conn: &Connection,
    ctx: &RequestContext,
    room_id: &str,
    user_id: &str,
) -> Result<Option<TopologicalPosition>, MembershipError> {
    ctx.check()?;
    let depth: Option<i64> = conn.query_row(
        "SELECT MAX(topological_pos) FROM room_memberships
         WHERE room_id = ?1 AND user_id = ?2",
        params![room_id, user_id],
        |row| row.get(0),
    )?;
    Ok(depth.map(TopologicalPosition))
}

/// Deletes every membership record for `room_id`.
///
/// Unconditional and irreversible. Returns the number of rows removed.
///
/// # Errors
///
/// Returns `MembershipError::Database` on SQL failure.
pub fn purge_room(
    conn: &Connection,
    ctx: &RequestContext,
    room_id: &str,
) -> Result<usize, MembershipError> {
    ctx.check()?;
    let count = conn.execute("DELETE FROM room_memberships WHERE room_id = ?1", [room_id])?;
    tracing::info!(room_id, count, "purged membership history for room");
    Ok(count)
}

fn map_row_to_record(row: &Row) -> rusqlite::Result<MembershipRecord> {
    let membership_str: String = row.get(2)?;
    let membership: Membership = membership_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(MembershipRecord {
        room_id: row.get(0)?,
        user_id: row.get(1)?,
        membership,
        event_id: row.get(3)?,
        stream_pos: StreamPosition(row.get(4)?),
        topological_pos: TopologicalPosition(row.get(5)?),
    })
}
