//! Error types and handling for Orrery
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for Orrery operations
pub type Result<T> = std::result::Result<T, OrreryError>;

/// Main error type for Orrery
#[derive(Debug, Error)]
pub enum OrreryError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// HTTP/Web server errors
    #[error("Web server error: {message}")]
    Web { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Network-related errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Upstream phase endpoint errors (bad status, malformed payload)
    #[error("API error: {message}")]
    Api { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl OrreryError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        OrreryError::Config {
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        OrreryError::Web {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        OrreryError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        OrreryError::Io {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        OrreryError::Network {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        OrreryError::Api {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        OrreryError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for OrreryError {
    fn from(err: std::io::Error) -> Self {
        OrreryError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for OrreryError {
    fn from(err: serde_yaml::Error) -> Self {
        OrreryError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for OrreryError {
    fn from(err: serde_json::Error) -> Self {
        OrreryError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for OrreryError {
    fn from(err: reqwest::Error) -> Self {
        OrreryError::network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = OrreryError::config("test config error");
        assert!(matches!(err, OrreryError::Config { .. }));

        let err = OrreryError::api("test api error");
        assert!(matches!(err, OrreryError::Api { .. }));

        let err = OrreryError::validation("field", "test validation error");
        assert!(matches!(err, OrreryError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = OrreryError::config("test error");
        let error_string = format!("{}", err);
        assert_eq!(error_string, "Configuration error: test error");

        let err = OrreryError::validation("test_field", "invalid value");
        let error_string = format!("{}", err);
        assert_eq!(error_string, "Validation error: test_field - invalid value");
    }
}
