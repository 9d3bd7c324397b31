//! Error types for Arbor.

use thiserror::Error;

/// Result type alias using ArborError.
pub type Result<T> = std::result::Result<T, ArborError>;

/// Errors that can occur in Arbor operations.
#[derive(Debug, Error)]
pub enum ArborError {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    // B+ tree errors
    #[error("Duplicate key: {key}")]
    DuplicateKey { key: String },

    #[error("Key not found: {key}")]
    KeyNotFound { key: String },

    /// A tree invariant does not hold. Never caused by caller input.
    #[error("B+ tree consistency fault: {0}")]
    InternalConsistency(String),

    // Configuration errors
    #[error("Invalid degree: {degree} (min {min})")]
    InvalidDegree { degree: usize, min: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Script errors
    #[error("Parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

impl ArborError {
    /// Builds a `DuplicateKey` error from any debuggable key.
    pub fn duplicate_key<K: std::fmt::Debug>(key: &K) -> Self {
        ArborError::DuplicateKey {
            key: format!("{key:?}"),
        }
    }

    /// Builds a `KeyNotFound` error from any debuggable key.
    pub fn key_not_found<K: std::fmt::Debug>(key: &K) -> Self {
        ArborError::KeyNotFound {
            key: format!("{key:?}"),
        }
    }

    /// Returns true for errors caused by caller input rather than a broken tree.
    ///
    /// A user error guarantees the tree was left untouched.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ArborError::DuplicateKey { .. } | ArborError::KeyNotFound { .. }
        )
    }
}
