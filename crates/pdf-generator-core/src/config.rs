use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use crate::error::Error;

/// Largest accepted upload, in bytes (5 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
/// Number of preview columns per grid row
pub const DEFAULT_MAX_COLUMNS: usize = 4;
/// Page resolution used to size PDF pages from pixel dimensions
pub const DEFAULT_RESOLUTION: f32 = 100.0;
/// File name offered for the generated PDF
pub const DEFAULT_DOWNLOAD_FILENAME: &str = "name.pdf";

/// What to do with an accepted upload that fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Report the file with a notice and keep processing the batch
    #[default]
    Skip,
    /// Fail the whole batch
    Abort,
}

impl DecodePolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "skip" => Some(Self::Skip),
            "abort" => Some(Self::Abort),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Abort => "abort",
        }
    }
}

impl std::fmt::Display for DecodePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Per-file upload limit in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Preview grid width
    #[serde(default = "default_max_columns")]
    pub max_columns: usize,

    /// Page resolution in dots per inch
    #[serde(default = "default_resolution")]
    pub resolution: f32,

    /// Name of the downloaded PDF
    #[serde(default = "default_download_filename")]
    pub download_filename: String,

    /// Handling of images that fail to decode
    #[serde(default)]
    pub on_decode_error: DecodePolicy,

    /// Idle sessions older than this are dropped by the web server
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
}

const fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

const fn default_max_columns() -> usize {
    DEFAULT_MAX_COLUMNS
}

const fn default_resolution() -> f32 {
    DEFAULT_RESOLUTION
}

fn default_download_filename() -> String {
    DEFAULT_DOWNLOAD_FILENAME.to_string()
}

const fn default_session_ttl_seconds() -> u64 {
    3600
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            max_columns: default_max_columns(),
            resolution: default_resolution(),
            download_filename: default_download_filename(),
            on_decode_error: DecodePolicy::default(),
            session_ttl_seconds: default_session_ttl_seconds(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/pdf-generator/config.toml, ./config.toml)
    pub fn load() -> Self {
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("pdf-generator").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_columns == 0 {
            return Err(invalid("max_columns", "must be at least 1"));
        }
        if self.max_file_size == 0 {
            return Err(invalid("max_file_size", "must be greater than zero"));
        }
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(invalid("resolution", "must be a positive number of dpi"));
        }
        if self.download_filename.trim().is_empty() {
            return Err(invalid("download_filename", "must not be empty"));
        }
        Ok(())
    }

    /// Grid width as a non-zero count.
    ///
    /// Falls back to the default for an unvalidated zero.
    pub fn columns(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_columns)
            .or_else(|| NonZeroUsize::new(DEFAULT_MAX_COLUMNS))
            .unwrap_or(NonZeroUsize::MIN)
    }
}

fn invalid(field: &str, reason: &str) -> Error {
    Error::ConfigInvalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Human-readable byte size for user-facing messages ("5 MiB", "812 KiB").
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;

    if bytes >= MIB {
        let value = bytes as f64 / MIB as f64;
        if bytes % MIB == 0 {
            format!("{} MiB", bytes / MIB)
        } else {
            format!("{value:.1} MiB")
        }
    } else if bytes >= KIB {
        format!("{} KiB", bytes / KIB)
    } else {
        format!("{bytes} bytes")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.max_file_size, 5 * 1024 * 1024);
        assert_eq!(config.max_columns, 4);
        assert!((config.resolution - 100.0).abs() < f32::EPSILON);
        assert_eq!(config.download_filename, "name.pdf");
        assert_eq!(config.on_decode_error, DecodePolicy::Skip);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("max_columns = 3\non_decode_error = \"abort\"").unwrap();
        assert_eq!(config.max_columns, 3);
        assert_eq!(config.on_decode_error, DecodePolicy::Abort);
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn test_from_file_rejects_zero_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_columns = 0").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { ref field, .. } if field == "max_columns"));
    }

    #[test]
    fn test_from_file_missing() {
        let result = AppConfig::from_file("/nonexistent/pdf-generator.toml");
        assert!(matches!(result, Err(Error::ConfigLoad(_))));
    }

    #[test]
    fn test_validate_resolution() {
        let config = AppConfig {
            resolution: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_decode_policy_names() {
        assert_eq!(DecodePolicy::from_name("Skip"), Some(DecodePolicy::Skip));
        assert_eq!(DecodePolicy::from_name("abort"), Some(DecodePolicy::Abort));
        assert_eq!(DecodePolicy::from_name("retry"), None);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(5 * 1024 * 1024), "5 MiB");
        assert_eq!(format_size(6 * 1024 * 1024 + 512 * 1024), "6.5 MiB");
        assert_eq!(format_size(2048), "2 KiB");
        assert_eq!(format_size(12), "12 bytes");
    }
}
