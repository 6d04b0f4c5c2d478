//! Output stream read and live-tail handlers.
//!
//! Provides:
//! - `GET /api/stream/{topic}`: pages forward through committed records
//! - `GET /api/stream/{topic}/live`: SSE tail of records as they commit

use crate::{api::ApiError, AppState};
use axum::{
    extract::{Extension, Path, Query},
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
    Json,
};
use futures_util::Stream;
use hearth_output::{read_stream, StreamFilter, StreamRecord, OUTPUT_TYPE_HEADER};
use hearth_types::RequestContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::{convert::Infallible, sync::Arc};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Query parameters for `GET /api/stream/{topic}`.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Return records after this offset.
    pub since: Option<i64>,
    /// Only records with this key (room id).
    pub key: Option<String>,
    /// Maximum number of records to return (default: 100, max: 1000).
    pub limit: Option<i64>,
}

/// Query parameters for `GET /api/stream/{topic}/live`.
#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    pub key: Option<String>,
}

/// A stream record as returned over HTTP.
#[derive(Debug, Serialize)]
pub struct StreamRecordBody {
    pub offset: i64,
    pub key: String,
    pub headers: BTreeMap<String, String>,
    pub produced_at: String,
    /// The decoded output event.
    pub event: Value,
}

impl From<StreamRecord> for StreamRecordBody {
    fn from(record: StreamRecord) -> Self {
        let event = decode_payload(&record.payload);
        Self {
            offset: record.offset,
            key: record.key,
            headers: record.headers,
            produced_at: record.produced_at,
            event,
        }
    }
}

/// Response wrapper for a page of the stream.
#[derive(Debug, Serialize)]
pub struct StreamResponse {
    pub records: Vec<StreamRecordBody>,
    pub count: usize,
    /// Pass as `since` to fetch the next page.
    pub next_since: i64,
}

/// Handler for `GET /api/stream/{topic}`.
pub async fn read_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(topic): Path<String>,
    Query(params): Query<StreamQuery>,
) -> Result<Json<StreamResponse>, ApiError> {
    let since = params.since.unwrap_or(0);
    if since < 0 {
        return Err(ApiError::BadRequest(format!("invalid since: {}", since)));
    }
    let filter = StreamFilter {
        since: Some(since),
        key: params.key,
        limit: Some(params.limit.unwrap_or(100).clamp(1, 1000)),
    };

    let records = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(ApiError::db_connection)?;
        read_stream(&conn, &RequestContext::background(), &topic, &filter)
            .map_err(|e| ApiError::InternalServerError(e.to_string()))
    })
    .await
    .map_err(ApiError::join)??;

    let next_since = records.last().map_or(since, |r| r.offset);
    let records: Vec<StreamRecordBody> = records.into_iter().map(Into::into).collect();
    Ok(Json(StreamResponse {
        count: records.len(),
        records,
        next_since,
    }))
}

/// Handler for `GET /api/stream/{topic}/live`.
///
/// Streams records of `topic` as they commit, optionally only those for one
/// key. Subscribers that lag lose records; they can catch up with the read
/// endpoint using the last offset they saw.
pub async fn live_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(topic): Path<String>,
    Query(params): Query<LiveQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.stream_tx.subscribe();
    let stream = BroadcastStream::new(rx);

    let mapped_stream = stream.filter_map(move |result| match result {
        Ok(record) => {
            if record.topic != topic || params.key.as_ref().is_some_and(|k| *k != record.key) {
                return None;
            }
            let event_type = record
                .headers
                .get(OUTPUT_TYPE_HEADER)
                .cloned()
                .unwrap_or_else(|| "message".to_string());
            let offset = record.offset;
            match serde_json::to_string(&StreamRecordBody::from(record)) {
                Ok(data) => Some(Ok(Event::default()
                    .id(offset.to_string())
                    .event(event_type)
                    .data(data))),
                Err(e) => {
                    tracing::error!("failed to serialize stream record: {}", e);
                    None
                }
            }
        }
        Err(broadcast_error) => {
            tracing::warn!(
                error = %broadcast_error,
                "output SSE stream lagged; records were dropped for this subscriber"
            );
            None
        }
    });

    Sse::new(mapped_stream).keep_alive(KeepAlive::default())
}

fn decode_payload(payload: &[u8]) -> Value {
    serde_json::from_slice(payload)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(payload).into_owned()))
}
