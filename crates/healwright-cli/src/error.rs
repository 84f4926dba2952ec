//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// The plan file is structurally wrong
    #[error("Invalid plan: {message}")]
    Plan {
        /// Error message
        message: String,
    },

    /// A prompt matched none of the step rules
    #[error("Unrecognised prompt in test '{test}': \"{prompt}\"")]
    UnrecognisedPrompt {
        /// Test the prompt belongs to
        test: String,
        /// The prompt text
        prompt: String,
    },

    /// One or more generated files failed manifest verification
    #[error("{failed} of {total} generated file(s) failed verification")]
    VerifyFailed {
        /// Files that failed
        failed: usize,
        /// Files checked
        total: usize,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Runtime library error
    #[error(transparent)]
    Heal(#[from] healwright::HealError),

    /// Generator error
    #[error(transparent)]
    Gen(#[from] healwright_gen::GenError),

    /// Plan or config YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Prompt rule failed to compile
    #[error("Prompt rule error: {0}")]
    Regex(#[from] regex::Error),
}

impl CliError {
    /// Create a plan error
    #[must_use]
    pub fn plan(message: impl Into<String>) -> Self {
        Self::Plan {
            message: message.into(),
        }
    }
}
