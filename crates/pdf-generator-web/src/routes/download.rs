//! Download route - assembles the session's images into one PDF.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::helpers::{OptionExt, ResultExt, RouteResult};
use crate::state::AppState;

/// Download the accepted images as a PDF, one page per image.
pub async fn download_pdf(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    // Clone decoded pages inside lock (O(1) each)
    let pages = session
        .with_session(|s| s.generator.pages())
        .await
        .or_not_found("Session not found")?;

    if pages.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "No images uploaded yet".to_string(),
        ));
    }

    // Assemble outside the lock, off the async runtime
    let assembler = state.generator.assembler().clone();
    let pdf = tokio::task::spawn_blocking(move || assembler.assemble_pages(&pages))
        .await
        .map_err(|e| {
            error!("PDF assembly task panicked: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PDF assembly failed".to_string(),
            )
        })?
        .or_internal_error()?;

    info!("Session {}: downloading {} bytes", session_id, pdf.len());

    let filename = &state.config().download_filename;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(pdf))
        .or_internal_error()
}
