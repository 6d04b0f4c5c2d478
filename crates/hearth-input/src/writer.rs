use hearth_db::DbPool;
use hearth_membership::{latest_topological_position, upsert_membership};
use hearth_output::OutputPublisher;
use hearth_types::{
    InputInviteEvent, InputKind, InputRoomEvent, Membership, OutputEvent, RequestContext,
    RoomEvent, StreamPosition,
};
use rusqlite::{Transaction, TransactionBehavior};

use crate::error::ProcessError;
use crate::events;
use crate::processor::EventProcessor;

/// Rows removed by [`RoomEventWriter::purge_room`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSummary {
    pub events: usize,
    pub memberships: usize,
}

/// Default [`EventProcessor`]: stores events, maintains membership history
/// and publishes output events.
///
/// Each event is written in its own IMMEDIATE transaction and published only
/// after that transaction commits and its connection is back in the pool.
#[derive(Clone)]
pub struct RoomEventWriter {
    pool: DbPool,
    publisher: OutputPublisher,
}

impl RoomEventWriter {
    pub fn new(pool: DbPool, publisher: OutputPublisher) -> Self {
        Self { pool, publisher }
    }

    pub fn publisher(&self) -> &OutputPublisher {
        &self.publisher
    }

    /// Deletes every stored event and membership record of `room_id`, then
    /// publishes a `purge_room` output event.
    ///
    /// Purging an unknown room succeeds and still publishes.
    pub fn purge_room(
        &self,
        ctx: &RequestContext,
        room_id: &str,
    ) -> Result<PurgeSummary, ProcessError> {
        ctx.check()?;
        let summary = self.in_transaction(ctx, |txn| {
            Ok(PurgeSummary {
                events: events::purge_room_events(txn, room_id)?,
                memberships: hearth_membership::purge_room(txn, ctx, room_id)?,
            })
        })?;

        self.publisher.write_output_events(
            ctx,
            room_id,
            &[OutputEvent::PurgeRoom {
                room_id: room_id.to_string(),
            }],
        )?;

        tracing::info!(
            room_id,
            events = summary.events,
            memberships = summary.memberships,
            "room purged"
        );
        Ok(summary)
    }

    /// Runs `write` in an IMMEDIATE transaction and commits it.
    ///
    /// The pooled connection is released before this returns. Publishing
    /// takes a connection of its own from the same pool.
    fn in_transaction<T>(
        &self,
        ctx: &RequestContext,
        write: impl FnOnce(&Transaction<'_>) -> Result<T, ProcessError>,
    ) -> Result<T, ProcessError> {
        let mut conn = self.pool.get()?;
        let txn = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = write(&txn)?;
        ctx.check()?;
        txn.commit()?;
        Ok(value)
    }
}

impl EventProcessor for RoomEventWriter {
    fn process_room_event(
        &self,
        ctx: &RequestContext,
        input: &InputRoomEvent,
    ) -> Result<(), ProcessError> {
        ctx.check()?;
        let event = &input.event;
        let outlier = input.kind == InputKind::Outlier;

        if outlier {
            let stream_position =
                self.in_transaction(ctx, |txn| events::store_event(txn, event, true))?;
            tracing::debug!(
                event_id = %event.event_id,
                room_id = %event.room_id,
                stream_pos = stream_position.0,
                "stored outlier"
            );
            return Ok(());
        }

        let backfill = input.kind == InputKind::Old;
        let (stream_position, updates) = self.in_transaction(ctx, |txn| {
            let stream_position = events::store_event(txn, event, false)?;
            let updates = if backfill {
                record_backfilled(txn, ctx, event, stream_position)?
            } else {
                record_current(txn, ctx, input, stream_position)?
            };
            Ok((stream_position, updates))
        })?;

        self.publisher
            .write_output_events(ctx, &event.room_id, &updates)?;

        tracing::debug!(
            event_id = %event.event_id,
            room_id = %event.room_id,
            kind = ?input.kind,
            stream_pos = stream_position.0,
            outputs = updates.len(),
            "room event applied"
        );
        Ok(())
    }

    fn process_invite_event(
        &self,
        ctx: &RequestContext,
        input: &InputInviteEvent,
    ) -> Result<(), ProcessError> {
        ctx.check()?;
        let event = &input.event;

        let membership = event.membership()?;
        if membership != Membership::Invite {
            return Err(ProcessError::NotAnInvite {
                event_id: event.event_id.clone(),
                membership,
            });
        }
        let invitee = event.membership_subject()?;

        let stream_position = self.in_transaction(ctx, |txn| {
            let stream_position = events::store_event(txn, event, false)?;
            upsert_membership(txn, ctx, event, stream_position, event.topological_position())?;
            Ok(stream_position)
        })?;

        self.publisher.write_output_events(
            ctx,
            &event.room_id,
            &[OutputEvent::NewInviteEvent {
                event: event.clone(),
                room_version: input.room_version.clone(),
                stream_position,
            }],
        )?;

        tracing::debug!(
            event_id = %event.event_id,
            room_id = %event.room_id,
            invitee,
            stream_pos = stream_position.0,
            "invite applied"
        );
        Ok(())
    }
}

/// Applies an event at the forward extremity: it becomes current state,
/// replacing whatever held its state slot before.
fn record_current(
    txn: &Transaction<'_>,
    ctx: &RequestContext,
    input: &InputRoomEvent,
    stream_position: StreamPosition,
) -> Result<Vec<OutputEvent>, ProcessError> {
    let event = &input.event;
    let replaced = events::previous_state_event(txn, event, stream_position)?;
    if event.is_membership() {
        upsert_membership(txn, ctx, event, stream_position, event.topological_position())?;
    }

    let mut updates = vec![OutputEvent::NewRoomEvent {
        event: event.clone(),
        add_state_event_ids: if event.is_state() {
            vec![event.event_id.clone()]
        } else {
            Vec::new()
        },
        remove_state_event_ids: replaced.iter().map(|e| e.event_id.clone()).collect(),
        stream_position,
        send_as_server: input.send_as_server.clone(),
    }];
    if let Some(retired) = retired_invite(event, replaced.as_ref())? {
        updates.push(retired);
    }
    updates.extend(redaction(event));
    Ok(updates)
}

/// Applies a historical event. It never changes current state and never
/// retires an invite. Its membership is recorded only when nothing
/// topologically later is known for the user.
fn record_backfilled(
    txn: &Transaction<'_>,
    ctx: &RequestContext,
    event: &RoomEvent,
    stream_position: StreamPosition,
) -> Result<Vec<OutputEvent>, ProcessError> {
    if event.is_membership() {
        let membership = event.membership()?;
        let user_id = event.membership_subject()?;
        let depth = event.topological_position();
        match latest_topological_position(txn, ctx, &event.room_id, user_id)? {
            Some(later) if later > depth => tracing::debug!(
                event_id = %event.event_id,
                user_id,
                membership = membership.as_str(),
                depth = depth.0,
                known = later.0,
                "backfilled membership is older than recorded history, skipping"
            ),
            _ => upsert_membership(txn, ctx, event, stream_position, depth)?,
        }
    }

    let mut updates = vec![OutputEvent::NewRoomEvent {
        event: event.clone(),
        add_state_event_ids: Vec::new(),
        remove_state_event_ids: Vec::new(),
        stream_position,
        send_as_server: None,
    }];
    updates.extend(redaction(event));
    Ok(updates)
}

fn redaction(event: &RoomEvent) -> Option<OutputEvent> {
    event
        .redacted_event_id()
        .map(|redacted_event_id| OutputEvent::RedactedEvent {
            redacted_event_id: redacted_event_id.to_string(),
            redacted_because: event.clone(),
        })
}

/// A member event that moves its subject out of `invite` retires the invite
/// it replaces.
fn retired_invite(
    event: &RoomEvent,
    replaced: Option<&RoomEvent>,
) -> Result<Option<OutputEvent>, ProcessError> {
    if !event.is_membership() {
        return Ok(None);
    }
    let Some(previous) = replaced else {
        return Ok(None);
    };
    let membership = event.membership()?;
    if membership == Membership::Invite || previous.membership().ok() != Some(Membership::Invite) {
        return Ok(None);
    }

    Ok(Some(OutputEvent::RetireInviteEvent {
        event_id: previous.event_id.clone(),
        room_id: event.room_id.clone(),
        target_user_id: event.membership_subject()?.to_string(),
        membership,
        retired_by_event_id: event.event_id.clone(),
    }))
}
