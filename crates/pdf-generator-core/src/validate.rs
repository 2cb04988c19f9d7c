//! Upload validation and per-file notices.

use serde::Serialize;

use crate::config::format_size;
use crate::error::Error;
use crate::upload::UploadedImage;

/// Category of a per-file notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Oversize,
    UnsupportedFormat,
    Decode,
}

/// User-visible error attached to one uploaded file.
///
/// A notice never stops the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub file_name: String,
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    /// Build a notice from a per-file error.
    ///
    /// Returns `None` for errors that are not tied to a single upload.
    pub fn from_error(error: &Error) -> Option<Self> {
        let (file_name, kind, message) = match error {
            Error::OversizeFile { name, size, limit } => {
                return Some(Self::oversize(name, *size, *limit));
            }
            Error::UnsupportedFormat { name } => (
                name,
                NoticeKind::UnsupportedFormat,
                format!("{name} is not a PNG or JPEG image."),
            ),
            Error::Decode { name, reason } => (
                name,
                NoticeKind::Decode,
                format!("{name} could not be read as an image: {reason}"),
            ),
            _ => return None,
        };

        Some(Self {
            file_name: file_name.clone(),
            kind,
            message,
        })
    }

    fn oversize(name: &str, size: u64, limit: u64) -> Self {
        Self {
            file_name: name.to_string(),
            kind: NoticeKind::Oversize,
            message: format!(
                "{name} is too large ({}). Please upload images smaller than {}.",
                format_size(size),
                format_size(limit)
            ),
        }
    }
}

/// Outcome of validating one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Accept,
    Reject(Notice),
}

impl Validation {
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// Size gate for uploads.
#[derive(Debug, Clone, Copy)]
pub struct UploadValidator {
    max_file_size: u64,
}

impl UploadValidator {
    pub const fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub const fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Reject uploads whose declared size exceeds the limit.
    ///
    /// A file of exactly the limit is accepted. Content is not inspected.
    pub fn validate(&self, image: &UploadedImage) -> Validation {
        if image.declared_size() <= self.max_file_size {
            return Validation::Accept;
        }

        tracing::warn!(
            "Rejecting {}: {} bytes exceeds the {} byte limit",
            image.name(),
            image.declared_size(),
            self.max_file_size
        );
        Validation::Reject(Notice::oversize(
            image.name(),
            image.declared_size(),
            self.max_file_size,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_FILE_SIZE;

    fn upload(size: u64) -> UploadedImage {
        UploadedImage::new("photo.jpg", vec![0u8; 4])
            .unwrap()
            .with_declared_size(size)
    }

    #[test]
    fn test_accepts_up_to_limit() {
        let validator = UploadValidator::new(DEFAULT_MAX_FILE_SIZE);
        assert!(validator.validate(&upload(1024 * 1024)).is_accepted());
        assert!(validator.validate(&upload(DEFAULT_MAX_FILE_SIZE)).is_accepted());
    }

    #[test]
    fn test_rejects_over_limit() {
        let validator = UploadValidator::new(DEFAULT_MAX_FILE_SIZE);
        let Validation::Reject(notice) = validator.validate(&upload(6 * 1024 * 1024)) else {
            panic!("6 MiB upload should be rejected");
        };
        assert_eq!(notice.kind, NoticeKind::Oversize);
        assert_eq!(notice.file_name, "photo.jpg");
        assert!(notice.message.contains("6 MiB"));
        assert!(notice.message.contains("smaller than 5 MiB"));
    }

    #[test]
    fn test_size_check_ignores_content() {
        let validator = UploadValidator::new(DEFAULT_MAX_FILE_SIZE);
        let garbage = UploadedImage::new("broken.png", b"not an image".to_vec()).unwrap();
        assert!(validator.validate(&garbage).is_accepted());
    }

    #[test]
    fn test_notice_only_for_file_errors() {
        let err = Error::PdfSave("disk full".to_string());
        assert!(Notice::from_error(&err).is_none());

        let err = Error::UnsupportedFormat {
            name: "a.gif".to_string(),
        };
        let notice = Notice::from_error(&err).unwrap();
        assert_eq!(notice.kind, NoticeKind::UnsupportedFormat);
    }
}
