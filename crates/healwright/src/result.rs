//! Result and error types for Healwright.

use thiserror::Error;

use crate::resolver::ResolutionAttempt;

/// Result type for Healwright operations
pub type HealResult<T> = Result<T, HealError>;

/// Errors that can occur while resolving, retrying or navigating
#[derive(Debug, Error)]
pub enum HealError {
    /// No candidate selector produced a visible element
    #[error("No element found for '{field}': {message} ({} candidate(s) tried)", attempts.len())]
    NotFound {
        /// Field name the candidates were built from
        field: String,
        /// Failure message of the last candidate tried
        message: String,
        /// Every candidate attempt, in the order tried
        attempts: Vec<ResolutionAttempt>,
    },

    /// Interaction with a located element failed
    #[error("{action} on '{target}' failed: {message}")]
    ActionFailure {
        /// Action name (fill, click, ...)
        action: String,
        /// Selector or field acted upon
        target: String,
        /// Error message
        message: String,
    },

    /// A single wait exceeded its budget
    #[error("{operation} timed out after {ms}ms")]
    Timeout {
        /// What was being waited for
        operation: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Driver-level page failure
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Retry budget spent without success
    #[error("'{label}' failed after {attempts} attempt(s): {last}")]
    RetryExhausted {
        /// Label of the retried action
        label: String,
        /// Number of attempts made
        attempts: u32,
        /// Last observed error
        #[source]
        last: Box<HealError>,
    },

    /// Every navigation strategy failed on every outer attempt
    #[error("Navigation to {url} failed after {attempts} attempt(s): {last}")]
    NavigationExhausted {
        /// Target URL
        url: String,
        /// Number of outer attempts made
        attempts: u32,
        /// Last observed error
        #[source]
        last: Box<HealError>,
    },

    /// A numbered test step failed
    #[error("Step {number} ({name}) failed: {source}")]
    StepFailed {
        /// 1-based step number
        number: usize,
        /// Step name
        name: String,
        /// Underlying failure
        #[source]
        source: Box<HealError>,
    },

    /// Whole test exceeded its budget
    #[error("Test '{name}' timed out after {ms}ms")]
    TestTimeout {
        /// Test name
        name: String,
        /// Budget in milliseconds
        ms: u64,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl HealError {
    /// Create an action failure
    #[must_use]
    pub fn action(action: impl Into<String>, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ActionFailure {
            action: action.into(),
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(operation: impl Into<String>, ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            ms,
        }
    }

    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether a retry may succeed where this attempt failed
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::ActionFailure { .. } | Self::Timeout { .. } | Self::Page { .. }
        )
    }

    /// Innermost error, following retry, navigation and step wrappers
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::RetryExhausted { last, .. } | Self::NavigationExhausted { last, .. } => last.root_cause(),
            Self::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
