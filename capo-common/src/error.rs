//! Common error types for CapoCanto

use thiserror::Error;

/// Common result type for CapoCanto operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across CapoCanto crates
#[derive(Error, Debug)]
pub enum Error {
    /// Bad user input: required field missing, invalid category, malformed file.
    ///
    /// `line` is the 1-based line of the offending import row (header is line 1).
    #[error("{}", describe_validation(.line, .message))]
    Validation { line: Option<usize>, message: String },

    /// Backend read/write failure (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Requested record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller's role does not allow the operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings blob or payload (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

fn describe_validation(line: &Option<usize>, message: &str) -> String {
    match line {
        Some(line) => format!("{} (line {})", message, line),
        None => message.to_string(),
    }
}

impl Error {
    /// Validation failure not tied to an import line
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            line: None,
            message: message.into(),
        }
    }

    /// Validation failure on a given 1-based import line
    pub fn validation_at(line: usize, message: impl Into<String>) -> Self {
        Error::Validation {
            line: Some(line),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_cites_line() {
        let err = Error::validation_at(3, "Title or mnemonic required");
        assert_eq!(err.to_string(), "Title or mnemonic required (line 3)");
    }

    #[test]
    fn test_validation_message_without_line() {
        let err = Error::validation("Invalid category");
        assert_eq!(err.to_string(), "Invalid category");
    }
}
