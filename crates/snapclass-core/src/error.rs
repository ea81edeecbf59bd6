//! Error types for snapclass

use std::num::ParseIntError;
use std::path::PathBuf;

/// Result type alias using snapclass's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause carried by errors raised inside an inference backend
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type for snapclass operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Label or model asset could not be read
    #[error("failed to read asset {}: {source}", .path.display())]
    AssetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Inference engine (or a required accelerator) rejected the model
    #[error("failed to load model: {message}")]
    ModelLoad {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Classifier used before a successful load or after close
    #[error("classifier is not ready (never loaded or already closed)")]
    NotReady,

    /// Engine execution fault or malformed engine output
    #[error("inference error: {0}")]
    Inference(String),

    /// Selected label is not a decimal class id
    #[error("label {label:?} is not a decimal class id: {source}")]
    LabelParse {
        label: String,
        #[source]
        source: ParseIntError,
    },

    /// Image does not cover the model's input region
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors outside asset loading
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),

    /// Image decoding errors
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Create a new asset read error
    pub fn asset_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::AssetRead {
            path: path.into(),
            source,
        }
    }

    /// Create a model load error without an underlying cause
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a model load error carrying the backend's cause
    pub fn model_load_with(msg: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ModelLoad {
            message: msg.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new label parse error
    pub fn label_parse(label: impl Into<String>, source: ParseIntError) -> Self {
        Self::LabelParse {
            label: label.into(),
            source,
        }
    }

    /// Create a new invalid image error
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Short, stable name of the error kind (used as a metrics label)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AssetRead { .. } => "asset_read",
            Self::ModelLoad { .. } => "model_load",
            Self::NotReady => "not_ready",
            Self::Inference(_) => "inference",
            Self::LabelParse { .. } => "label_parse",
            Self::InvalidImage(_) => "invalid_image",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Image(_) => "image",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_asset_read_keeps_path_and_cause() {
        let err = Error::asset_read(
            "labels.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );

        assert!(err.to_string().contains("labels.txt"));
        assert!(err.source().is_some());
        assert_eq!(err.kind(), "asset_read");
    }

    #[test]
    fn test_model_load_with_cause() {
        let err = Error::model_load_with("engine rejected blob", "bad header");
        assert!(matches!(err, Error::ModelLoad { .. }));
        assert_eq!(err.source().unwrap().to_string(), "bad header");

        let bare = Error::model_load("no accelerator");
        assert!(bare.source().is_none());
    }

    #[test]
    fn test_label_parse_message() {
        let source = "cat".parse::<i64>().unwrap_err();
        let err = Error::label_parse("cat", source);
        assert!(err.to_string().contains("\"cat\""));
    }
}
