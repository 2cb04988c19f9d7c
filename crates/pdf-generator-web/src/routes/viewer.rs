//! Viewer routes - preview images and grid layout.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
    Json,
};
use pdf_generator_core::Notice;
use serde::Serialize;
use std::sync::Arc;

use crate::helpers::{OptionExt, ResultExt, RouteResult};
use crate::state::AppState;

/// Placement of one accepted image.
#[derive(Debug, Serialize)]
pub struct LayoutEntry {
    pub index: usize,
    pub name: String,
    pub row: usize,
    pub column: usize,
}

/// Grid state of a session.
#[derive(Debug, Serialize)]
pub struct LayoutResponse {
    pub columns: usize,
    pub images: Vec<LayoutEntry>,
    pub notices: Vec<Notice>,
}

/// Preview bytes of an accepted image, served as uploaded.
///
/// The ETag is the MD5 of the content, so previews revalidate cheaply.
pub async fn get_image(
    State(state): State<Arc<AppState>>,
    Path((session_id, index)): Path<(String, usize)>,
    headers: HeaderMap,
) -> RouteResult<Response> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    // Bytes clone is O(1)
    let (bytes, content_type, content_id) = session
        .with_session(|s| {
            s.generator.accepted_image(index).map(|accepted| {
                (
                    accepted.image.bytes_shared(),
                    accepted.image.media_type().mime_type(),
                    accepted.image.content_id(),
                )
            })
        })
        .await
        .or_not_found("Session not found")?
        .or_not_found("Image not found")?;

    let etag = format!("\"{content_id}\"");

    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && if_none_match.to_str().ok() == Some(etag.as_str())
    {
        return Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(header::ETAG, etag)
            .body(Body::empty())
            .or_internal_error();
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ETAG, etag)
        .header(header::CACHE_CONTROL, "private, max-age=3600, must-revalidate")
        .body(Body::from(bytes))
        .or_internal_error()
}

/// Grid positions and notices as JSON.
pub async fn get_layout(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> RouteResult<Json<LayoutResponse>> {
    let session = state
        .get_session(&session_id)
        .await
        .or_not_found("Session not found")?;

    let layout = session
        .with_session(|s| LayoutResponse {
            columns: s.generator.layout().max_columns().get(),
            images: s
                .generator
                .accepted()
                .iter()
                .map(|accepted| LayoutEntry {
                    index: accepted.index,
                    name: accepted.image.name().to_string(),
                    row: accepted.position.row,
                    column: accepted.position.column,
                })
                .collect(),
            notices: s.generator.notices().to_vec(),
        })
        .await
        .or_not_found("Session not found")?;

    Ok(Json(layout))
}
