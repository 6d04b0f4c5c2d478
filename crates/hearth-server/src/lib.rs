//! Hearth server library logic.

pub mod api;
pub mod api_admin;
pub mod api_input;
pub mod api_membership;
pub mod api_stream;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use hearth_db::DbPool;
use hearth_input::{InputPipeline, RoomEventWriter};
use hearth_output::{MessageProducer, OutputPublisher, SqliteStreamProducer, StreamRecord};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Ingestion pipeline driving `writer`.
    pub pipeline: InputPipeline,
    /// The default event processor, also used for purges.
    pub writer: RoomEventWriter,
    /// Every record committed to the output stream, for SSE subscribers.
    pub stream_tx: broadcast::Sender<StreamRecord>,
    /// Deadline applied to each input batch, if any.
    pub request_timeout: Option<Duration>,
}

impl AppState {
    /// Wires the SQLite output stream, publisher, writer and pipeline
    /// together over `pool`.
    pub fn new(pool: DbPool, topic: &str, live_buffer: usize) -> Self {
        let (stream_tx, _) = broadcast::channel(live_buffer.max(1));
        let producer: Arc<dyn MessageProducer> =
            Arc::new(SqliteStreamProducer::new(pool.clone()).with_live_feed(stream_tx.clone()));
        let publisher = OutputPublisher::new(producer, topic);
        let writer = RoomEventWriter::new(pool.clone(), publisher);
        let pipeline = InputPipeline::new(Arc::new(writer.clone()));

        Self {
            pool,
            pipeline,
            writer,
            stream_tx,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn publisher(&self) -> &OutputPublisher {
        self.writer.publisher()
    }
}

/// Maximum request body size (8 MiB). Input batches can carry many events.
const MAX_REQUEST_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/roomserver/inputRoomEvents",
            post(api_input::input_room_events_handler),
        )
        .route(
            "/api/rooms/{roomId}/members/{userId}/membership",
            get(api_membership::get_membership_handler),
        )
        .route(
            "/api/admin/rooms/{roomId}/purge",
            post(api_admin::purge_room_handler),
        )
        .route("/api/stream/{topic}", get(api_stream::read_stream_handler))
        .route(
            "/api/stream/{topic}/live",
            get(api_stream::live_stream_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(axum::middleware::from_fn(
            middleware::trace_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
