//! Membership history lookup.

use crate::{api::ApiError, middleware::RequestTrace, AppState};
use axum::extract::{Extension, Json, Path, Query};
use hearth_membership::{select_membership, MembershipRecord};
use hearth_types::{Membership, RequestContext};
use serde::Deserialize;
use std::sync::Arc;

/// Query parameters for the membership lookup.
#[derive(Debug, Deserialize)]
pub struct MembershipQuery {
    /// Comma-separated candidate states, e.g. `join,leave`. Defaults to all.
    pub states: Option<String>,
}

/// Handler for `GET /api/rooms/{roomId}/members/{userId}/membership`.
///
/// Returns the most recent record among the requested states.
pub async fn get_membership_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(RequestTrace(trace)): Extension<RequestTrace>,
    Path((room_id, user_id)): Path<(String, String)>,
    Query(params): Query<MembershipQuery>,
) -> Result<Json<MembershipRecord>, ApiError> {
    let candidates = parse_states(params.states.as_deref())?;
    let ctx = RequestContext::new(trace);

    let record = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(ApiError::db_connection)?;
        select_membership(&conn, &ctx, &room_id, &user_id, &candidates)
            .map_err(|e| ApiError::InternalServerError(e.to_string()))?
            .ok_or_else(|| {
                ApiError::NotFound(format!("no membership for {} in {}", user_id, room_id))
            })
    })
    .await
    .map_err(ApiError::join)??;

    Ok(Json(record))
}

fn parse_states(states: Option<&str>) -> Result<Vec<Membership>, ApiError> {
    let Some(states) = states else {
        return Ok(Membership::ALL.to_vec());
    };
    states
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| ApiError::BadRequest(format!("unknown membership state: {}", s)))
        })
        .collect()
}
