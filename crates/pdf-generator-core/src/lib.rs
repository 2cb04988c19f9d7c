//! PDF Generator Core Library
//!
//! This library provides the core functionality for merging images into a PDF:
//! - Upload model and size validation
//! - Per-session preview grid layout
//! - Image decoding and multi-page PDF assembly

pub mod config;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod session;
pub mod upload;
pub mod util;
pub mod validate;

pub use config::{
    format_size, AppConfig, DecodePolicy, DEFAULT_DOWNLOAD_FILENAME, DEFAULT_MAX_COLUMNS,
    DEFAULT_MAX_FILE_SIZE, DEFAULT_RESOLUTION,
};
pub use error::{Error, Result};
pub use layout::{ContainerCache, GridPosition, LayoutContext, LayoutCursor, Surface};
pub use pdf::{DocumentAssembler, PageImage};
pub use session::{AcceptedImage, BatchReport, GeneratorSession, PreparedBatch};
pub use upload::{MediaType, UploadedImage};
pub use validate::{Notice, NoticeKind, UploadValidator, Validation};

use session::PreparedItem;
use tracing::{info, warn};

/// High-level generator that combines validation, decoding and assembly
#[derive(Debug, Clone)]
pub struct PdfGenerator {
    config: AppConfig,
    validator: UploadValidator,
    assembler: DocumentAssembler,
}

impl PdfGenerator {
    /// Create a generator with the given configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        // "name.pdf" is titled "name"
        let title = config.download_filename.trim_end_matches(".pdf").to_string();

        Ok(Self {
            validator: UploadValidator::new(config.max_file_size),
            assembler: DocumentAssembler::new(config.resolution).with_title(title),
            config,
        })
    }

    /// Start a session with its own cursor at (0, 0) and no containers.
    pub fn new_session<S: Surface>(&self) -> GeneratorSession<S> {
        GeneratorSession::new(self.config.columns())
    }

    /// Validate and decode a batch without touching any session.
    pub fn prepare(&self, images: Vec<UploadedImage>) -> Result<PreparedBatch> {
        self.prepare_uploads(images.into_iter().map(Ok))
    }

    /// Like [`prepare`](Self::prepare), for uploads that may have failed the
    /// extension allow-list.
    ///
    /// Per-file errors become notices. Under `DecodePolicy::Abort` the first
    /// decode failure is returned instead.
    pub fn prepare_uploads(
        &self,
        uploads: impl IntoIterator<Item = Result<UploadedImage>>,
    ) -> Result<PreparedBatch> {
        let mut batch = PreparedBatch::default();

        for upload in uploads {
            let item = match upload {
                Ok(image) => self.prepare_one(image)?,
                Err(e) => {
                    let notice = Notice::from_error(&e).ok_or(e)?;
                    warn!("{}", notice.message);
                    PreparedItem::Rejected(notice)
                }
            };
            batch.items.push(item);
        }

        Ok(batch)
    }

    fn prepare_one(&self, image: UploadedImage) -> Result<PreparedItem> {
        if let Validation::Reject(notice) = self.validator.validate(&image) {
            return Ok(PreparedItem::Rejected(notice));
        }

        match PageImage::decode(&image) {
            Ok(page) => Ok(PreparedItem::Ready(image, page)),
            Err(e) if self.config.on_decode_error == DecodePolicy::Abort => Err(e),
            Err(e) => {
                warn!("Skipping {}: {}", image.name(), e);
                Notice::from_error(&e)
                    .map(PreparedItem::Rejected)
                    .ok_or(e)
            }
        }
    }

    /// Run one pass: prepare the batch, then commit it to the session.
    ///
    /// On error the session is left unchanged.
    pub fn process<S: Surface>(
        &self,
        session: &mut GeneratorSession<S>,
        images: Vec<UploadedImage>,
    ) -> Result<BatchReport> {
        let batch = self.prepare(images)?;
        let report = session.commit(batch);
        info!(
            "Processed batch: {} accepted, {} rejected",
            report.accepted(),
            report.rejected()
        );
        Ok(report)
    }

    /// Assemble the session's accepted images into one PDF.
    ///
    /// Returns an empty buffer when nothing was accepted.
    pub fn generate<S>(&self, session: &GeneratorSession<S>) -> Result<Vec<u8>> {
        self.assembler.assemble_pages(&session.pages())
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    pub const fn validator(&self) -> &UploadValidator {
        &self.validator
    }

    pub const fn assembler(&self) -> &DocumentAssembler {
        &self.assembler
    }
}
