//! HTTP route handlers for the PDF generator web application.
//!
//! Pages are Askama templates from the `templates` module; the API returns
//! redirects, JSON, image bytes or the assembled PDF.

mod download;
mod pages;
mod session;
mod upload;
mod viewer;

pub use download::download_pdf;
pub use pages::{index, view_session};
pub use session::close_session;
pub use upload::{upload_images, upload_more};
pub use viewer::{get_image, get_layout};

/// Multipart field carrying the uploaded images (repeated once per file).
pub const UPLOAD_FIELD: &str = "files";

/// Canonical URL of a session's preview grid.
pub fn view_url(session_id: &str) -> String {
    format!("/view/{session_id}")
}
