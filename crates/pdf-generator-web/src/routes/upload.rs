//! Upload routes - image upload handling.
//!
//! Every POST is one pass: the batch is validated and decoded off the async
//! runtime, then committed to the session's grid in upload order.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use axum_extra::extract::Multipart;
use pdf_generator_core::{PreparedBatch, UploadedImage};
use std::sync::Arc;
use tracing::{error, info};

use super::{view_url, UPLOAD_FIELD};
use crate::helpers::{redirect_after_post, OptionExt, ResultExt, RouteResult};
use crate::state::{AppState, RowContainer};

/// Upload images into a fresh session, then redirect to its preview grid.
pub async fn upload_images(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> RouteResult<Response> {
    let uploads = read_uploads(multipart).await?;
    let batch = prepare(&state, uploads).await?;

    let mut session = state.generator.new_session::<RowContainer>();
    let report = session.commit(batch);
    let session_id = state.create_session(session).await;

    info!(
        "Created session {} ({} accepted, {} rejected)",
        session_id,
        report.accepted(),
        report.rejected()
    );

    redirect_after_post(&headers, &view_url(&session_id))
}

/// Upload more images into an existing session.
///
/// The grid cursor continues where the previous pass stopped.
pub async fn upload_more(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    multipart: Multipart,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let uploads = read_uploads(multipart).await?;
    let batch = prepare(&state, uploads).await?;

    let report = session
        .with_session_mut(|s| s.generator.commit(batch))
        .await
        .or_not_found("Session not found")?;

    info!(
        "Session {}: {} accepted, {} rejected",
        session_id,
        report.accepted(),
        report.rejected()
    );

    redirect_after_post(&headers, &view_url(&session_id))
}

/// Collect every file part of the upload field.
///
/// Names outside the png/jpg/jpeg allow-list are kept as errors so they
/// surface as notices rather than failing the request.
async fn read_uploads(
    mut multipart: Multipart,
) -> RouteResult<Vec<pdf_generator_core::Result<UploadedImage>>> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await.or_bad_request()? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.or_bad_request()?;

        // Browsers send one empty part when no file was picked
        if filename.is_empty() && data.is_empty() {
            continue;
        }

        uploads.push(UploadedImage::new(filename, data));
    }

    if uploads.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No files uploaded".to_string()));
    }

    Ok(uploads)
}

/// Validate and decode in a blocking task to avoid blocking the async runtime.
async fn prepare(
    state: &AppState,
    uploads: Vec<pdf_generator_core::Result<UploadedImage>>,
) -> RouteResult<PreparedBatch> {
    let generator = state.generator.clone();

    tokio::task::spawn_blocking(move || generator.prepare_uploads(uploads))
        .await
        .map_err(|e| {
            error!("Image decoding task panicked: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Image decoding failed".to_string(),
            )
        })?
        .map_err(|e| {
            error!("Upload rejected: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        })
}
