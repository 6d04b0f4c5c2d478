//! Ingestion RPC handler.

use crate::{api::ApiError, middleware::RequestTrace, AppState};
use axum::{
    body::Bytes,
    extract::{Extension, Json},
};
use hearth_types::{InputRoomEventsRequest, InputRoomEventsResponse, RequestContext};
use std::sync::Arc;

/// Handler for `POST /api/roomserver/inputRoomEvents`.
///
/// Decodes the batch and runs it through the input pipeline on a blocking
/// thread. If the client goes away, the request context is cancelled and the
/// pipeline stops before its next event; events already applied stay applied.
///
/// A body that does not decode is a 400. A batch that fails part way is a
/// 500 naming the failing event.
pub async fn input_room_events_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(RequestTrace(trace)): Extension<RequestTrace>,
    body: Bytes,
) -> Result<Json<InputRoomEventsResponse>, ApiError> {
    let request: InputRoomEventsRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid input batch: {}", e)))?;

    let mut ctx = RequestContext::new(trace);
    if let Some(timeout) = state.request_timeout {
        ctx = ctx.with_timeout(timeout);
    }
    let cancel_guard = ctx.cancel_on_drop();

    let result = tokio::task::spawn_blocking(move || {
        state.pipeline.input_room_events(&ctx, &request)
    })
    .await
    .map_err(ApiError::join)?;
    cancel_guard.disarm();

    result
        .map(Json)
        .map_err(|e| ApiError::InternalServerError(e.to_string()))
}
