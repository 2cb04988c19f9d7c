//! Multi-page PDF assembly.
//!
//! One image per page, in input order. Each page's MediaBox is the image's
//! pixel size at the configured resolution and the image fills it exactly:
//! ```text
//! points = pixels * 72 / dpi
//! ```

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info};

use super::page::PageImage;
use crate::config::DEFAULT_RESOLUTION;
use crate::error::{Error, Result};
use crate::upload::UploadedImage;

/// Resource name of the page image in every page's XObject dictionary.
const IMAGE_RESOURCE: &str = "Im0";

const PRODUCER: &str = concat!("pdf-generator ", env!("CARGO_PKG_VERSION"));

/// Builds a single PDF from an ordered list of images.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    resolution: f32,
    title: Option<String>,
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION)
    }
}

impl DocumentAssembler {
    pub const fn new(resolution: f32) -> Self {
        Self {
            resolution,
            title: None,
        }
    }

    /// Set the document title written to the Info dictionary.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub const fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Decode and assemble uploads.
    ///
    /// An empty input yields an empty buffer. The first image that fails to
    /// decode aborts assembly with `Error::Decode`.
    pub fn assemble(&self, images: &[UploadedImage]) -> Result<Vec<u8>> {
        let pages = images
            .iter()
            .map(PageImage::decode)
            .collect::<Result<Vec<_>>>()?;
        self.assemble_pages(&pages)
    }

    /// Assemble already decoded pages.
    pub fn assemble_pages(&self, pages: &[PageImage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            debug!("No pages to assemble, returning empty buffer");
            return Ok(Vec::new());
        }

        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();

        let mut kids = Vec::with_capacity(pages.len());
        for (index, page) in pages.iter().enumerate() {
            let page_id = self.add_page(&mut document, pages_id, page)?;
            debug!("Added page {} from {}", index + 1, page.name());
            kids.push(Object::Reference(page_id));
        }

        let count = i64::try_from(kids.len())
            .map_err(|e| Error::PdfAssemble(format!("too many pages: {e}")))?;
        let pages_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ]);
        document.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = document.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));

        let mut info_dict = Dictionary::from_iter([("Producer", Object::string_literal(PRODUCER))]);
        if let Some(title) = &self.title {
            info_dict.set("Title", Object::string_literal(title.as_str()));
        }
        let info_id = document.add_object(info_dict);

        document.trailer.set("Root", Object::Reference(catalog_id));
        document.trailer.set("Info", Object::Reference(info_id));

        document.compress();

        let mut output = Vec::new();
        document
            .save_to(&mut output)
            .map_err(|e| Error::PdfSave(format!("Failed to save PDF: {e}")))?;

        info!("Assembled {} pages ({} bytes)", pages.len(), output.len());
        Ok(output)
    }

    /// Add the image, its content stream and the page object.
    fn add_page(&self, document: &mut Document, pages_id: ObjectId, page: &PageImage) -> Result<ObjectId> {
        let mut image = page.image_stream().clone();
        if let Some(smask) = page.smask_stream() {
            let smask_id = document.add_object(smask.clone());
            image.dict.set("SMask", Object::Reference(smask_id));
        }
        let image_id = document.add_object(image);

        let (width, height) = page.page_size(self.resolution);

        // Scale the unit-square image to the full page
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width.into(),
                        0.into(),
                        0.into(),
                        height.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content
            .encode()
            .map_err(|e| Error::PdfAssemble(format!("Failed to encode page content: {e}")))?;
        let content_id = document.add_object(Stream::new(Dictionary::new(), content_bytes));

        let resources = Dictionary::from_iter([(
            "XObject",
            Object::Dictionary(Dictionary::from_iter([(
                IMAGE_RESOURCE,
                Object::Reference(image_id),
            )])),
        )]);

        Ok(document.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), width.into(), height.into()]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ])))
    }
}

// =============================================================================
// Tests
// =============================================================================
