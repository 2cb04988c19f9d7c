//! Page routes - full HTML page renders.

use axum::extract::{Path, State};
use std::sync::Arc;

use crate::helpers::{OptionExt, RouteResult};
use crate::state::AppState;
use crate::templates::{AppTemplate, IndexTemplate};

/// Landing page with upload form.
pub async fn index(State(state): State<Arc<AppState>>) -> IndexTemplate {
    IndexTemplate::new(state.config())
}

/// Preview grid of a session, with its notices and the download control.
pub async fn view_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<AppTemplate> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let (rows, notices, image_count) = session
        .with_session(|s| {
            let rows = s
                .generator
                .layout()
                .containers()
                .iter()
                .map(|(_, row)| row.clone())
                .collect();
            (rows, s.generator.notices().to_vec(), s.generator.accepted().len())
        })
        .await
        .or_not_found("Session not found")?;

    Ok(AppTemplate::new(
        session_id,
        state.config(),
        rows,
        notices,
        image_count,
    ))
}
