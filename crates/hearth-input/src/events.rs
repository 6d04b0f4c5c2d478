//! Queries against the `room_events` table.

use hearth_types::{RoomEvent, StreamPosition};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::ProcessError;

/// Stores `event` and returns its stream position.
///
/// Idempotent on event id: a re-delivered event keeps the position it was
/// first given. An outlier that is later delivered as a timeline event
/// loses its outlier flag.
pub(crate) fn store_event(
    conn: &Connection,
    event: &RoomEvent,
    outlier: bool,
) -> Result<StreamPosition, ProcessError> {
    let event_json = serde_json::to_string(event)?;
    conn.execute(
        "INSERT INTO room_events
            (event_id, room_id, event_type, state_key, depth, outlier, event_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT (event_id) DO UPDATE SET
            outlier = room_events.outlier AND excluded.outlier",
        params![
            event.event_id,
            event.room_id,
            event.event_type,
            event.state_key,
            event.depth,
            outlier,
            event_json,
        ],
    )?;

    let stream_pos: i64 = conn.query_row(
        "SELECT stream_pos FROM room_events WHERE event_id = ?1",
        [&event.event_id],
        |row| row.get(0),
    )?;
    Ok(StreamPosition(stream_pos))
}

/// Returns the latest timeline state event for the same (room, type,
/// state key) as `event`, stored before `before`.
///
/// "Latest" is by depth first, so a backfilled event stored after the
/// current one never shadows it.
pub(crate) fn previous_state_event(
    conn: &Connection,
    event: &RoomEvent,
    before: StreamPosition,
) -> Result<Option<RoomEvent>, ProcessError> {
    let Some(state_key) = event.state_key.as_deref() else {
        return Ok(None);
    };

    let event_json: Option<String> = conn
        .query_row(
            "SELECT event_json FROM room_events
             WHERE room_id = ?1 AND event_type = ?2 AND state_key = ?3
               AND stream_pos < ?4 AND outlier = 0
             ORDER BY depth DESC, stream_pos DESC
             LIMIT 1",
            params![event.room_id, event.event_type, state_key, before.0],
            |row| row.get(0),
        )
        .optional()?;

    event_json
        .map(|json| serde_json::from_str(&json).map_err(ProcessError::from))
        .transpose()
}

/// Deletes every stored event of `room_id`. Returns the number removed.
pub(crate) fn purge_room_events(conn: &Connection, room_id: &str) -> Result<usize, ProcessError> {
    Ok(conn.execute("DELETE FROM room_events WHERE room_id = ?1", [room_id])?)
}
