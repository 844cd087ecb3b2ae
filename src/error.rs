//! Error types for stagehand.

use thiserror::Error;

/// The main error type for stagehand operations.
#[derive(Debug, Error)]
pub enum DeployError {
    /// A required configuration field is missing or out of range.
    #[error("Validation error on '{field}': {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// An imported parameter document could not be understood.
    #[error("Bad input: {0}")]
    BadInput(String),

    /// A generated document could not be rendered.
    #[error("Render error: {0}")]
    Render(String),

    /// The settings file is unreadable or malformed.
    #[error("Settings error: {0}")]
    Settings(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// Create a validation error for the given field.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for DeployError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadInput(err.to_string())
    }
}

/// Result type alias for stagehand operations.
pub type DeployResult<T> = Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeployError::validation("business_key", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Validation error on 'business_key': must not be empty"
        );
    }

    #[test]
    fn test_json_error_is_bad_input() {
        let err: DeployError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, DeployError::BadInput(_)));
    }
}
