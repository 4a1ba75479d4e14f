//! Error types for the layer document.

use thiserror::Error;

use crate::LayerId;

/// Result type alias using DocumentError.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Primary error type for document, catalogue and layer set operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    // === Lookup Errors ===
    #[error("Layer not found: {0}")]
    NotFound(LayerId),

    #[error("Row {index} out of range for layer set of {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Layer set {index} out of range ({len} allocated, at most {max})")]
    LayerSetOutOfRange { index: usize, len: usize, max: usize },

    // === Structural Errors ===
    #[error("Expected {expected} entries, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Invalid permutation: {0}")]
    InvalidPermutation(String),

    #[error("Layer already exists: {0}")]
    AlreadyExists(LayerId),

    #[error("Layer {0} is still referenced by a layer set")]
    DanglingReference(LayerId),

    #[error("Layer {0} is not an RGB composite")]
    NotComposite(LayerId),

    #[error("Layer {0} is not an image and cannot feed an RGB channel")]
    InvalidComponent(LayerId),

    // === Collaborator Errors ===
    #[error("Failed to import '{path}': {message}")]
    Import { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DocumentError {
    /// Whether the error was caused by an unknown identifier or row.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            DocumentError::NotFound(_)
                | DocumentError::IndexOutOfRange { .. }
                | DocumentError::LayerSetOutOfRange { .. }
        )
    }

    pub fn import(path: impl std::fmt::Display, message: impl Into<String>) -> Self {
        DocumentError::Import {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for DocumentError {
    fn from(err: std::io::Error) -> Self {
        DocumentError::Import {
            path: String::new(),
            message: err.to_string(),
        }
    }
}
