//! Askama templates for the upload and preview pages.
//!
//! ## Template Structure
//!
//! - `base.html` - Common layout with CSS/JS
//! - `index.html` - Landing page with upload form
//! - `app.html` - Preview grid, notices and download after an upload
//!
//! Forms carry both `action` and `hx-post`, so they work with and without
//! JavaScript.

use askama::Template;
use askama_web::WebTemplate;
use pdf_generator_core::{format_size, AppConfig, MediaType, Notice};

use crate::routes::UPLOAD_FIELD;
use crate::state::RowContainer;

/// Landing page with upload form.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    /// `accept` attribute of the file input
    pub accept: String,
    pub field: &'static str,
    pub max_size: String,
}

impl IndexTemplate {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            accept: MediaType::accept_attribute(),
            field: UPLOAD_FIELD,
            max_size: format_size(config.max_file_size),
        }
    }
}

/// Preview page of one session.
#[derive(Template, WebTemplate)]
#[template(path = "app.html")]
pub struct AppTemplate {
    pub session_id: String,
    pub rows: Vec<RowContainer>,
    /// One banner per rejected file
    pub notices: Vec<Notice>,
    pub image_count: usize,
    pub download_filename: String,
    pub accept: String,
    pub field: &'static str,
    pub max_size: String,
}

impl AppTemplate {
    pub fn new(
        session_id: String,
        config: &AppConfig,
        rows: Vec<RowContainer>,
        notices: Vec<Notice>,
        image_count: usize,
    ) -> Self {
        Self {
            session_id,
            rows,
            notices,
            image_count,
            download_filename: config.download_filename.clone(),
            accept: MediaType::accept_attribute(),
            field: UPLOAD_FIELD,
            max_size: format_size(config.max_file_size),
        }
    }

    /// The download control is only offered once something was accepted.
    pub const fn has_images(&self) -> bool {
        self.image_count > 0
    }
}
