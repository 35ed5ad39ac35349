//! Result and error types for Escenario.

use thiserror::Error;

/// Result type for Escenario operations
pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// Errors that can occur while driving a scenario
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Selector never resolved to a matching element within budget
    #[error("Timed out after {timeout_ms}ms waiting for {selector}")]
    LocatorTimeout {
        /// Selector description
        selector: String,
        /// Budget in milliseconds
        timeout_ms: u64,
    },

    /// Action attempted on an element that is hidden, disabled or of the wrong kind
    #[error("Cannot {action} {selector}: {reason}")]
    PreconditionViolation {
        /// Action name
        action: String,
        /// Selector description
        selector: String,
        /// Unmet condition
        reason: String,
    },

    /// Expected-vs-actual mismatch
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Diagnostic message
        message: String,
    },

    /// Exception thrown by the application under test
    #[error("Uncaught exception from page: {message}")]
    UnhandledPageException {
        /// Exception text
        message: String,
    },

    /// Handle used after the document it belonged to was replaced
    #[error("Element handle {node} is stale (document {handle_epoch}, current {current_epoch})")]
    StaleElement {
        /// Node reference
        node: u64,
        /// Document epoch recorded in the handle
        handle_epoch: u64,
        /// Current document epoch
        current_epoch: u64,
    },

    /// `<select>` has no option with the requested value
    #[error("No option with value '{value}' in {selector}")]
    NoSuchOption {
        /// Selector description
        selector: String,
        /// Requested option value
        value: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Browser or driver failure
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Fixture error (setup failed)
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// Invalid configuration or scenario file
    #[error("Configuration error: {message}")]
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

impl ScenarioError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
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

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a precondition violation
    #[must_use]
    pub fn precondition(
        action: impl Into<String>,
        selector: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::PreconditionViolation {
            action: action.into(),
            selector: selector.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is a scenario-level failure the runner records and moves past.
    ///
    /// Every variant is recoverable at scenario level; this only separates
    /// failures caused by the page under test from harness faults in logs.
    #[must_use]
    pub const fn is_harness_fault(&self) -> bool {
        matches!(
            self,
            Self::Driver { .. }
                | Self::Fixture { .. }
                | Self::Config { .. }
                | Self::Io(_)
                | Self::Json(_)
                | Self::Yaml(_)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_timeout_message() {
        let err = ScenarioError::LocatorTimeout {
            selector: "#username".to_string(),
            timeout_ms: 10_000,
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 10000ms waiting for #username"
        );
    }

    #[test]
    fn test_assertion_message_is_verbatim() {
        let err = ScenarioError::assertion("expected url to contain '/items' but was '/'");
        assert!(err
            .to_string()
            .ends_with("expected url to contain '/items' but was '/'"));
    }

    #[test]
    fn test_precondition_names_action_and_reason() {
        let err = ScenarioError::precondition("click", ".submit-btn", "element is disabled");
        assert_eq!(err.to_string(), "Cannot click .submit-btn: element is disabled");
    }

    #[test]
    fn test_harness_fault_split() {
        assert!(ScenarioError::driver("socket closed").is_harness_fault());
        assert!(!ScenarioError::assertion("nope").is_harness_fault());
        assert!(!ScenarioError::Timeout { ms: 5 }.is_harness_fault());
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ScenarioError = io_err.into();
        assert!(err.to_string().contains("I/O"));
    }
}
