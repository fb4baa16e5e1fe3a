// src/error.rs

//! Unified error handling for the catalog browser.

use std::fmt;

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Backend answered with a non-success status
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transition not allowed from the current view
    #[error("Cannot {action} from the {from} view")]
    Navigation { from: String, action: String },

    /// Downloading a file failed
    #[error("Download error for {context}: {message}")]
    Download { context: String, message: String },
}

impl AppError {
    /// Create a backend error from a status code and response body.
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a navigation error for an illegal transition.
    pub fn navigation(from: impl fmt::Display, action: impl Into<String>) -> Self {
        Self::Navigation {
            from: from.to_string(),
            action: action.into(),
        }
    }

    /// Create a download error with context.
    pub fn download(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Download {
            context: context.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_message() {
        let err = AppError::navigation("Home", "go back");
        assert_eq!(err.to_string(), "Cannot go back from the Home view");
    }

    #[test]
    fn test_backend_message() {
        let err = AppError::backend(503, "unavailable");
        assert_eq!(err.to_string(), "Backend error (503): unavailable");
    }
}
