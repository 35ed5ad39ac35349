//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Scenario files that failed to parse or validate
    #[error("{failed} scenario file(s) are invalid")]
    InvalidFiles {
        /// Number of rejected files
        failed: usize,
    },

    /// The run finished but results differ from expectations
    #[error("{unexpected} scenario(s) did not meet their expectation")]
    RunFailed {
        /// Failed or unexpectedly passing scenarios
        unexpected: usize,
    },

    /// Built without a browser engine
    #[error("this build has no browser support; rebuild with --features browser")]
    BrowserUnavailable,

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Escenario library error
    #[error("Escenario error: {0}")]
    Scenario(#[from] escenario::ScenarioError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Process exit code: 1 for test verdicts, 2 for everything that
    /// prevented a run
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::RunFailed { .. } | Self::InvalidFiles { .. } => 1,
            _ => 2,
        }
    }
}
