//! Durable output stream backed by the `output_stream` table.
//!
//! Writes go through [`SqliteStreamProducer`], which appends a whole batch
//! in one IMMEDIATE transaction and assigns each message the next offset of
//! its topic. Because offsets are assigned in slice order under the write
//! lock, messages sharing a key are read back in the order they were sent.
//!
//! Reads go through [`read_stream`], which pages forward from an offset.

use hearth_db::DbPool;
use hearth_types::RequestContext;
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

use crate::error::StreamError;
use crate::message::ProducerMessage;
use crate::producer::MessageProducer;

/// A message as stored on the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    /// Position within the topic, starting at 1.
    pub offset: i64,
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
    pub headers: BTreeMap<String, String>,
    /// When the message was committed (SQLite `datetime('now')`, UTC).
    pub produced_at: String,
}

/// Appends messages to the `output_stream` table.
pub struct SqliteStreamProducer {
    pool: DbPool,
    closed: AtomicBool,
    live_tx: Option<broadcast::Sender<StreamRecord>>,
}

impl SqliteStreamProducer {
    /// Opens a producer writing through `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            closed: AtomicBool::new(false),
            live_tx: None,
        }
    }

    /// Also fans every committed record out on `tx` for live consumers.
    ///
    /// The feed is best effort. Slow subscribers may lag and miss records;
    /// they can catch up from the table with [`read_stream`].
    pub fn with_live_feed(mut self, tx: broadcast::Sender<StreamRecord>) -> Self {
        self.live_tx = Some(tx);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl MessageProducer for SqliteStreamProducer {
    fn send_messages(
        &self,
        ctx: &RequestContext,
        messages: &[ProducerMessage],
    ) -> Result<(), StreamError> {
        if self.is_closed() {
            return Err(StreamError::Closed);
        }
        ctx.check()?;
        if messages.is_empty() {
            return Ok(());
        }

        let mut conn = self.pool.get()?;
        let txn = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut records = Vec::with_capacity(messages.len());
        for message in messages {
            if message.key.is_empty() {
                return Err(StreamError::Rejected(format!(
                    "message for topic {} has an empty key",
                    message.topic
                )));
            }
            let headers_json = serde_json::to_string(&message.headers)?;
            let (offset, produced_at) = txn.query_row(
                "INSERT INTO output_stream
                    (topic, stream_offset, partition_key, payload, headers_json)
                 VALUES (
                    ?1,
                    (SELECT COALESCE(MAX(stream_offset), 0) + 1 FROM output_stream WHERE topic = ?1),
                    ?2, ?3, ?4
                 )
                 RETURNING stream_offset, produced_at",
                params![message.topic, message.key, message.value, headers_json],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )?;
            records.push(StreamRecord {
                offset,
                topic: message.topic.clone(),
                key: message.key.clone(),
                payload: message.value.clone(),
                headers: message.headers.clone(),
                produced_at,
            });
        }

        // Last chance to abandon the batch; dropping the transaction rolls it back.
        ctx.check()?;
        txn.commit()?;

        tracing::debug!(
            count = records.len(),
            first_offset = records.first().map(|r| r.offset),
            "appended batch to output stream"
        );

        if let Some(tx) = &self.live_tx {
            for record in records {
                if tx.send(record).is_err() {
                    // No live subscribers; the durable copy is already committed.
                    break;
                }
            }
        }

        Ok(())
    }

    fn close(&self) -> Result<(), StreamError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::info!("output stream producer closed");
        }
        Ok(())
    }
}

/// Filter criteria for reading the stream.
#[derive(Debug, Clone, Default)]
pub struct StreamFilter {
    /// Only return records with an offset strictly greater than this.
    pub since: Option<i64>,
    /// Only return records with this key.
    pub key: Option<String>,
    /// Maximum number of records to return (default: 100).
    pub limit: Option<i64>,
}

/// Reads records from `topic` in offset order.
///
/// # Errors
///
/// Returns `StreamError::Database` on SQL failure, or `StreamError::Headers`
/// if a stored header map cannot be decoded.
pub fn read_stream(
    conn: &Connection,
    ctx: &RequestContext,
    topic: &str,
    filter: &StreamFilter,
) -> Result<Vec<StreamRecord>, StreamError> {
    ctx.check()?;
    let since = filter.since.unwrap_or(0);
    let limit = filter.limit.unwrap_or(100);

    let mut stmt = conn.prepare(
        "SELECT stream_offset, topic, partition_key, payload, headers_json, produced_at
         FROM output_stream
         WHERE topic = ?1 AND stream_offset > ?2 AND (?3 IS NULL OR partition_key = ?3)
         ORDER BY stream_offset ASC
         LIMIT ?4",
    )?;
    let rows = stmt.query_map(
        params![topic, since, filter.key, limit],
        map_row_to_record,
    )?;

    let mut records = Vec::new();
    for row in rows {
        let (record, headers_json) = row?;
        records.push(StreamRecord {
            headers: serde_json::from_str(&headers_json)?,
            ..record
        });
    }
    Ok(records)
}

fn map_row_to_record(row: &Row) -> rusqlite::Result<(StreamRecord, String)> {
    Ok((
        StreamRecord {
            offset: row.get(0)?,
            topic: row.get(1)?,
            key: row.get(2)?,
            payload: row.get(3)?,
            headers: BTreeMap::new(),
            produced_at: row.get(5)?,
        },
        row.get(4)?,
    ))
}
