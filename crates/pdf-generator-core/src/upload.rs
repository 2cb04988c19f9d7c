//! Uploaded image model.

use bytes::Bytes;
use mime_guess::mime;
use serde::Serialize;

use crate::error::{Error, Result};

/// Raster formats accepted for upload.
///
/// `jpg` and `jpeg` are two extensions of the same format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Png,
    Jpeg,
}

impl MediaType {
    /// Extensions offered by upload pickers.
    pub const EXTENSIONS: [&'static str; 3] = ["png", "jpg", "jpeg"];

    /// Resolve the media type from a file name's extension.
    pub fn from_file_name(name: &str) -> Result<Self> {
        mime_guess::from_path(name)
            .iter()
            .find_map(|m| Self::from_mime(&m))
            .ok_or_else(|| Error::UnsupportedFormat {
                name: name.to_string(),
            })
    }

    fn from_mime(m: &mime::Mime) -> Option<Self> {
        if *m == mime::IMAGE_PNG {
            Some(Self::Png)
        } else if *m == mime::IMAGE_JPEG {
            Some(Self::Jpeg)
        } else {
            None
        }
    }

    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// `accept` attribute value for HTML file inputs.
    pub fn accept_attribute() -> String {
        Self::EXTENSIONS
            .iter()
            .map(|ext| format!(".{ext}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// An image as received from an upload form or the command line.
///
/// Cloning is O(1): the payload is a reference-counted `Bytes`.
#[derive(Clone)]
pub struct UploadedImage {
    name: String,
    bytes: Bytes,
    /// Size reported by the uploader; checked against the upload limit
    declared_size: u64,
    media_type: MediaType,
}

impl UploadedImage {
    /// Create an upload whose declared size is its payload length.
    ///
    /// Fails with `UnsupportedFormat` when the name has no png/jpg/jpeg
    /// extension.
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self> {
        let name = name.into();
        let media_type = MediaType::from_file_name(&name)?;
        Ok(Self::with_media_type(name, bytes, media_type))
    }

    pub fn with_media_type(
        name: impl Into<String>,
        bytes: impl Into<Bytes>,
        media_type: MediaType,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            declared_size: bytes.len() as u64,
            bytes,
            media_type,
        }
    }

    /// Override the declared size (uploaders may report it separately).
    #[must_use]
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = size;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the payload, for serving it without copying.
    pub fn bytes_shared(&self) -> Bytes {
        self.bytes.clone()
    }

    pub const fn declared_size(&self) -> u64 {
        self.declared_size
    }

    pub const fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// MD5 hex of the payload, usable as an HTTP entity tag.
    pub fn content_id(&self) -> String {
        format!("{:x}", md5::compute(&self.bytes))
    }
}

impl std::fmt::Debug for UploadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedImage")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("declared_size", &self.declared_size)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_extension() {
        assert_eq!(MediaType::from_file_name("a.png").unwrap(), MediaType::Png);
        assert_eq!(MediaType::from_file_name("b.JPG").unwrap(), MediaType::Jpeg);
        assert_eq!(MediaType::from_file_name("c.jpeg").unwrap(), MediaType::Jpeg);
    }

    #[test]
    fn test_media_type_rejects_other_formats() {
        for name in ["scan.gif", "notes.txt", "no_extension"] {
            let err = MediaType::from_file_name(name).unwrap_err();
            assert!(matches!(err, Error::UnsupportedFormat { .. }), "{name}");
        }
    }

    #[test]
    fn test_declared_size_defaults_to_payload() {
        let image = UploadedImage::new("x.png", vec![0u8; 10]).unwrap();
        assert_eq!(image.declared_size(), 10);

        let image = image.with_declared_size(6 * 1024 * 1024);
        assert_eq!(image.declared_size(), 6 * 1024 * 1024);
        assert_eq!(image.bytes().len(), 10);
    }

    #[test]
    fn test_content_id_is_stable() {
        let a = UploadedImage::new("a.png", b"same".to_vec()).unwrap();
        let b = UploadedImage::new("b.png", b"same".to_vec()).unwrap();
        assert_eq!(a.content_id(), b.content_id());
        assert_eq!(a.content_id().len(), 32);
    }

    #[test]
    fn test_accept_attribute() {
        assert_eq!(MediaType::accept_attribute(), ".png,.jpg,.jpeg");
    }
}
