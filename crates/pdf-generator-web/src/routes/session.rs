//! Session routes - explicit end of an interaction.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use std::sync::Arc;
use tracing::info;

use crate::helpers::{redirect_after_post, RouteResult};
use crate::state::AppState;

/// Drop the session with its grid and images, then go back to the upload page.
pub async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> RouteResult<Response> {
    if !state.remove_session(&session_id).await {
        return Err((StatusCode::NOT_FOUND, "Session not found".to_string()));
    }

    info!("Closed session {}", session_id);
    redirect_after_post(&headers, "/")
}
