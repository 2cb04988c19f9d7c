//! Decoding uploads into PDF-ready image XObjects.
//!
//! # Normalization
//!
//! - Baseline/progressive JPEG with 1 or 3 components is embedded verbatim
//!   with `/DCTDecode`; the PDF viewer decodes the original bytes.
//! - Every other input (PNG, CMYK JPEG, 16-bit data) is decoded, reduced to
//!   8-bit Gray or RGB samples and Flate-compressed.
//! - A non-opaque alpha channel becomes an 8-bit `/SMask`.

use std::sync::Arc;

use image::{ColorType, DynamicImage, ImageFormat};
use lopdf::{Dictionary, Object, Stream};
use tracing::debug;

use crate::error::{Error, Result};
use crate::upload::UploadedImage;

/// PDF user-space units per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// A decoded image ready to be placed on a page.
///
/// Cloning is O(1); the compressed streams are shared.
#[derive(Clone)]
pub struct PageImage {
    inner: Arc<PageImageData>,
}

struct PageImageData {
    name: String,
    width: u32,
    height: u32,
    passthrough: bool,
    image: Stream,
    smask: Option<Stream>,
}

impl PageImage {
    /// Decode an upload.
    ///
    /// Fails with `Error::Decode` when the bytes are not a PNG or JPEG image
    /// the codec can read.
    pub fn decode(upload: &UploadedImage) -> Result<Self> {
        let name = upload.name();
        let bytes = upload.bytes();

        let format = image::guess_format(bytes).map_err(|e| Error::decode(name, e))?;
        if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
            return Err(Error::decode(
                name,
                format!("unsupported image format {format:?}"),
            ));
        }

        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| Error::decode(name, e))?;
        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Err(Error::decode(name, "image has no pixels"));
        }

        let data = match jpeg_color_space(format, bytes) {
            Some(color_space) => PageImageData {
                name: name.to_string(),
                width,
                height,
                passthrough: true,
                image: Stream::new(
                    image_dict(width, height, color_space, Some("DCTDecode")),
                    bytes.to_vec(),
                ),
                smask: None,
            },
            None => Self::normalize(name, &decoded)?,
        };

        debug!(
            "Decoded {} ({}x{}, {})",
            name,
            width,
            height,
            if data.passthrough { "DCT passthrough" } else { "flate" }
        );

        Ok(Self {
            inner: Arc::new(data),
        })
    }

    /// Re-encode decoded pixels as Flate-compressed 8-bit samples.
    fn normalize(name: &str, decoded: &DynamicImage) -> Result<PageImageData> {
        let (width, height) = (decoded.width(), decoded.height());
        let color = decoded.color();
        let gray = matches!(
            color,
            ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16
        );

        let (samples, alpha) = match (gray, color.has_alpha()) {
            (true, false) => (decoded.to_luma8().into_raw(), None),
            (false, false) => (decoded.to_rgb8().into_raw(), None),
            (true, true) => split_alpha(&decoded.to_luma_alpha8().into_raw(), 1),
            (false, true) => split_alpha(&decoded.to_rgba8().into_raw(), 3),
        };

        let color_space = if gray { "DeviceGray" } else { "DeviceRGB" };
        let mut image = Stream::new(image_dict(width, height, color_space, None), samples);
        image
            .compress()
            .map_err(|e| Error::decode(name, format!("failed to compress samples: {e}")))?;

        let smask = match alpha {
            Some(alpha) => {
                let mut smask = Stream::new(image_dict(width, height, "DeviceGray", None), alpha);
                smask
                    .compress()
                    .map_err(|e| Error::decode(name, format!("failed to compress alpha: {e}")))?;
                Some(smask)
            }
            None => None,
        };

        Ok(PageImageData {
            name: name.to_string(),
            width,
            height,
            passthrough: false,
            image,
            smask,
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Whether the original JPEG bytes are embedded unchanged.
    pub fn is_passthrough(&self) -> bool {
        self.inner.passthrough
    }

    pub fn has_alpha(&self) -> bool {
        self.inner.smask.is_some()
    }

    /// Page size in points at the given resolution (dpi).
    #[allow(clippy::cast_precision_loss)]
    pub fn page_size(&self, resolution: f32) -> (f32, f32) {
        (
            self.inner.width as f32 * POINTS_PER_INCH / resolution,
            self.inner.height as f32 * POINTS_PER_INCH / resolution,
        )
    }

    pub(crate) fn image_stream(&self) -> &Stream {
        &self.inner.image
    }

    pub(crate) fn smask_stream(&self) -> Option<&Stream> {
        self.inner.smask.as_ref()
    }
}

impl std::fmt::Debug for PageImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageImage")
            .field("name", &self.inner.name)
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .field("passthrough", &self.inner.passthrough)
            .field("has_alpha", &self.inner.smask.is_some())
            .finish()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn image_dict(width: u32, height: u32, color_space: &str, filter: Option<&str>) -> Dictionary {
    let mut dict = Dictionary::from_iter([
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(width))),
        ("Height", Object::Integer(i64::from(height))),
        ("ColorSpace", Object::Name(color_space.as_bytes().to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
    ]);
    if let Some(filter) = filter {
        dict.set("Filter", Object::Name(filter.as_bytes().to_vec()));
    }
    dict
}

/// Split interleaved color+alpha samples.
///
/// The alpha plane is dropped when every pixel is opaque.
fn split_alpha(interleaved: &[u8], color_channels: usize) -> (Vec<u8>, Option<Vec<u8>>) {
    let stride = color_channels + 1;
    let pixels = interleaved.len() / stride;
    let mut color = Vec::with_capacity(pixels * color_channels);
    let mut alpha = Vec::with_capacity(pixels);

    for pixel in interleaved.chunks_exact(stride) {
        color.extend_from_slice(&pixel[..color_channels]);
        alpha.push(pixel[color_channels]);
    }

    let opaque = alpha.iter().all(|&a| a == u8::MAX);
    (color, (!opaque).then_some(alpha))
}

/// PDF color space for a JPEG that can be embedded without re-encoding.
fn jpeg_color_space(format: ImageFormat, bytes: &[u8]) -> Option<&'static str> {
    if format != ImageFormat::Jpeg {
        return None;
    }
    match jpeg_components(bytes)? {
        1 => Some("DeviceGray"),
        3 => Some("DeviceRGB"),
        _ => None,
    }
}

/// Component count from the first SOF segment of a JPEG stream.
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    if bytes.get(..2)? != [0xFF, 0xD8] {
        return None;
    }

    let mut pos = 2;
    loop {
        if *bytes.get(pos)? != 0xFF {
            return None;
        }
        // Fill bytes
        while *bytes.get(pos + 1)? == 0xFF {
            pos += 1;
        }
        let marker = *bytes.get(pos + 1)?;
        pos += 2;

        match marker {
            // Standalone markers carry no length
            0x01 | 0xD0..=0xD7 => continue,
            0xD9 | 0xDA => return None,
            _ => {}
        }

        let length = usize::from(u16::from_be_bytes([*bytes.get(pos)?, *bytes.get(pos + 1)?]));
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            // length(2) precision(1) height(2) width(2) components(1)
            return bytes.get(pos + 7).copied();
        }
        pos += length;
    }
}
