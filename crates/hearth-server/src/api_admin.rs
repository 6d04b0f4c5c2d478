//! Admin API handlers for the Hearth server.

use crate::{api::ApiError, middleware::RequestTrace, AppState};
use axum::extract::{Extension, Json, Path};
use hearth_types::RequestContext;
use serde::Serialize;
use std::sync::Arc;

/// Response body for a purge.
#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub room_id: String,
    /// Number of stored events deleted.
    pub events: usize,
    /// Number of membership records deleted.
    pub memberships: usize,
}

/// Handler for `POST /api/admin/rooms/{roomId}/purge`.
///
/// Deletes the room's events and membership history and announces the purge
/// on the output stream. Purging an unknown room succeeds with zero counts.
pub async fn purge_room_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(RequestTrace(trace)): Extension<RequestTrace>,
    Path(room_id): Path<String>,
) -> Result<Json<PurgeResponse>, ApiError> {
    let ctx = RequestContext::new(trace);
    let target = room_id.clone();

    let summary = tokio::task::spawn_blocking(move || state.writer.purge_room(&ctx, &target))
        .await
        .map_err(ApiError::join)?
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    Ok(Json(PurgeResponse {
        room_id,
        events: summary.events,
        memberships: summary.memberships,
    }))
}
