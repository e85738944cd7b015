use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Failed to decode image {}: {source}", path.display())]
    DecodeFailure {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest error at {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No line segments detected, no skew signal found")]
    NoSkewSignal,

    #[error("Malformed line filename: {0}")]
    MalformedLineFilename(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Output directory {} is already used by {owner}", dir.display())]
    OutputCollision { dir: PathBuf, owner: String },
}

impl ExtractError {
    /// Short machine-readable code, recorded in the batch manifest
    pub fn code(&self) -> &'static str {
        match self {
            ExtractError::InputNotFound(_) => "INPUT_NOT_FOUND",
            ExtractError::DecodeFailure { .. } => "DECODE_FAILURE",
            ExtractError::Encode { .. } => "ENCODE_ERROR",
            ExtractError::Storage { .. } => "STORAGE_ERROR",
            ExtractError::Manifest { .. } => "MANIFEST_ERROR",
            ExtractError::NoSkewSignal => "NO_SKEW_SIGNAL",
            ExtractError::MalformedLineFilename(_) => "MALFORMED_LINE_FILENAME",
            ExtractError::InvalidConfig(_) => "INVALID_CONFIG",
            ExtractError::OutputCollision { .. } => "OUTPUT_COLLISION",
        }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExtractError::Storage {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            ExtractError::InputNotFound(PathBuf::from("images")),
            ExtractError::NoSkewSignal,
            ExtractError::MalformedLineFilename("lineX.jpg".to_string()),
            ExtractError::InvalidConfig("bad".to_string()),
            ExtractError::storage("out", std::io::Error::other("disk full")),
            ExtractError::OutputCollision {
                dir: PathBuf::from("out/page"),
                owner: "page.jpg".to_string(),
            },
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_error_messages_name_the_path() {
        let err = ExtractError::InputNotFound(PathBuf::from("/nowhere/images"));
        assert!(err.to_string().contains("/nowhere/images"));
    }
}
