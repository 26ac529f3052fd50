//! Errors produced by the composition engine.

use std::path::PathBuf;

/// Errors that can occur while validating a request or rendering a version.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown color name '{0}'")]
    UnknownColorName(String),

    #[error("Payload is too large for QR version {version}")]
    EncodingCapacityExceeded { version: u8 },

    #[error("QR encoding failed for version {version}: {reason}")]
    Encoding { version: u8, reason: String },

    #[error("Title does not fit the caption band at any allowed font size (version {version})")]
    TitleTooSmall { version: u8 },

    #[error("Unsupported output format '{0}'")]
    UnsupportedOutputFormat(String),

    #[error("Failed to load asset {}: {reason}", .path.display())]
    AssetLoad { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl EngineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn asset(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration(_) => "invalid_configuration",
            Self::UnknownColorName(_) => "unknown_color_name",
            Self::EncodingCapacityExceeded { .. } => "encoding_capacity_exceeded",
            Self::Encoding { .. } => "encoding",
            Self::TitleTooSmall { .. } => "title_too_small",
            Self::UnsupportedOutputFormat(_) => "unsupported_output_format",
            Self::AssetLoad { .. } => "asset_load",
            Self::Io(_) => "io",
            Self::Image(_) => "image",
        }
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_error_mentions_path() {
        let err = EngineError::asset("logos/missing.png", "not found");
        assert!(err.to_string().contains("logos/missing.png"));
        assert!(err.to_string().contains("not found"));
        assert_eq!(err.kind(), "asset_load");
    }
}
