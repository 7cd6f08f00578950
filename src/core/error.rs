//! Error types for the apexmut library.

use thiserror::Error;

/// Result type alias using apexmut's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating or executing mutants.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error from tree-sitter.
    #[error("Parse error in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// Configuration could not be loaded: missing file, TOML syntax or a
    /// bad env override.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mutually exclusive options were given together (e.g. include and exclude).
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// A precondition of the mutation run was not met. Aborts the whole run.
    #[error("{message}")]
    Preflight { message: String },

    /// A mutation candidate points outside the source it was computed from.
    #[error("Invalid mutation span: {message}")]
    MutationSpan { message: String },

    /// Failure reported by the remote execution platform.
    ///
    /// Displayed verbatim so that outcome classification sees the platform text.
    #[error("{message}")]
    Remote { message: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid skip pattern.
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Threshold violation (for CI/CD integration).
    #[error("Threshold violation: {message}")]
    ThresholdViolation { message: String, score: f64 },
}

impl Error {
    /// Create a new preflight error.
    pub fn preflight(message: impl Into<String>) -> Self {
        Self::Preflight {
            message: message.into(),
        }
    }

    /// Create a new remote platform error.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Create a new mutation span error.
    pub fn mutation_span(message: impl Into<String>) -> Self {
        Self::MutationSpan {
            message: message.into(),
        }
    }

    /// Create a new configuration conflict error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new config loading error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a threshold violation error.
    pub fn threshold_violation(message: impl Into<String>, score: f64) -> Self {
        Self::ThresholdViolation {
            message: message.into(),
            score,
        }
    }

    /// The bare message of this error, as used for outcome classification.
    ///
    /// Remote and preflight errors carry their text unprefixed; every other
    /// variant falls back to its display form.
    pub fn message(&self) -> String {
        match self {
            Self::Remote { message } | Self::Preflight { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::preflight("Class Foo does not compile");
        assert_eq!(err.to_string(), "Class Foo does not compile");

        let err = Error::configuration("include and exclude are mutually exclusive");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: include and exclude are mutually exclusive"
        );
    }

    #[test]
    fn test_remote_message_is_verbatim() {
        let err = Error::remote("Deployment failed: line 3");
        assert_eq!(err.message(), "Deployment failed: line 3");
        assert_eq!(err.to_string(), "Deployment failed: line 3");
    }

    #[test]
    fn test_message_falls_back_to_display() {
        let err = Error::mutation_span("offset 40 beyond source length 12");
        assert_eq!(
            err.message(),
            "Invalid mutation span: offset 40 beyond source length 12"
        );
    }

    #[test]
    fn test_threshold_violation() {
        let err = Error::threshold_violation("Score below minimum", 45.0);
        match err {
            Error::ThresholdViolation { message, score } => {
                assert_eq!(message, "Score below minimum");
                assert!((score - 45.0).abs() < f64::EPSILON);
            }
            _ => panic!("Expected ThresholdViolation"),
        }
    }
}
