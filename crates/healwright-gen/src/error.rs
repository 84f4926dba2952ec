//! Error types for `healwright-gen`.

use thiserror::Error;

/// Result type alias for generation operations.
pub type GenResult<T> = std::result::Result<T, GenError>;

/// Errors that can occur while building, rendering or verifying test files.
#[derive(Debug, Error)]
pub enum GenError {
    /// Invalid identifier name (reserved word, invalid characters, etc.)
    #[error("Invalid identifier '{name}': {reason}")]
    InvalidIdentifier {
        /// The invalid identifier
        name: String,
        /// Why it's invalid
        reason: String,
    },

    /// A test script cannot be rendered
    #[error("Invalid test script '{script}': {reason}")]
    InvalidScript {
        /// Script name
        script: String,
        /// What is wrong with it
        reason: String,
    },

    /// Manifest verification failed (file missing or unreadable)
    #[error("Manifest verification failed for '{path}': {reason}")]
    ManifestError {
        /// Path to the file
        path: String,
        /// Why verification failed
        reason: String,
    },

    /// Hash mismatch (generated file was modified)
    #[error("Hash mismatch for '{path}': expected {expected}, got {actual}")]
    HashMismatch {
        /// Path to the file
        path: String,
        /// Expected hash
        expected: String,
        /// Actual hash
        actual: String,
    },

    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenError {
    /// Create a script error
    #[must_use]
    pub fn script(script: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidScript {
            script: script.into(),
            reason: reason.into(),
        }
    }
}
