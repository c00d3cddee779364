//! Centralized error types for the shared library.
//!
//! Every failure in resource loading, properties parsing or HTTP client
//! construction is reported through [`PlatformError`].

use std::path::PathBuf;
use thiserror::Error;

/// Common error type for shared operations.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A file exists but could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// The path that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Resource not found in any location
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PlatformError {
    /// Create an I/O error for the given path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a not found error for the given resource.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create an invalid input error with the given message.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the error means the resource was absent rather than broken.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlatformError::not_found("classpath:vault.properties");
        assert_eq!(
            err.to_string(),
            "Resource not found: classpath:vault.properties"
        );

        let err = PlatformError::invalid_input("bad escape");
        assert_eq!(err.to_string(), "Invalid input: bad escape");
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = PlatformError::io(
            "/etc/vault.properties",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/etc/vault.properties"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_classification() {
        assert!(PlatformError::not_found("x").is_not_found());
        assert!(!PlatformError::invalid_input("x").is_not_found());
    }
}
