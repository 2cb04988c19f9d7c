use thiserror::Error;

/// Unified error type for pdf-generator-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Upload checks (size limit, accepted formats)
/// - Image decoding
/// - PDF assembly and serialization
/// - Configuration loading and validation
/// - General I/O operations
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Upload Errors
    // ==========================================================================
    /// Uploaded file is larger than the configured limit
    #[error("file '{name}' is too large ({size} bytes, limit is {limit} bytes)")]
    OversizeFile { name: String, size: u64, limit: u64 },

    /// Uploaded file does not have a png/jpg/jpeg extension
    #[error("file '{name}' is not a PNG or JPEG image")]
    UnsupportedFormat { name: String },

    // ==========================================================================
    // Image Errors
    // ==========================================================================
    /// Image bytes could not be decoded
    #[error("failed to decode image '{name}': {reason}")]
    Decode { name: String, reason: String },

    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// Failed to build the PDF object graph
    #[error("failed to assemble PDF: {0}")]
    PdfAssemble(String),

    /// Failed to serialize the PDF
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn decode(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
