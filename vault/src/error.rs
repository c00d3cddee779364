//! Vault error types using thiserror 2.0.
//!
//! Every variant is fatal for the pool: nothing here is retried.

use thiserror::Error;
use vault_filter_common::PlatformError;

/// Vault-specific errors.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Config resource missing or unreadable
    #[error("Failed to load Vault config from {location}: {source}")]
    ConfigLoad {
        /// Resource location that was tried
        location: String,
        /// Underlying load error
        #[source]
        source: PlatformError,
    },

    /// Required field absent or blank
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Client keystore missing or unusable
    #[error("Keystore error: {0}")]
    KeyStore(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Path not found on the gateway
    #[error("Not found at path: {0}")]
    NotFound(String),

    /// Gateway unavailable
    #[error("Vault unavailable: {0}")]
    Unavailable(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    Decrypt(String),

    /// Response did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Shared library error, such as an HTTP client that failed to build
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Pool initialization aborted
    #[error("Failed to decrypt pool password")]
    Initialization(#[source] Box<VaultError>),
}

/// Result type for Vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    /// Create a config load error.
    #[must_use]
    pub fn config_load(location: impl Into<String>, source: PlatformError) -> Self {
        Self::ConfigLoad {
            location: location.into(),
            source,
        }
    }

    /// Create an invalid config error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an authentication failed error.
    #[must_use]
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed(msg.into())
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a malformed response error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Wrap as a pool initialization failure.
    #[must_use]
    pub fn into_initialization(self) -> Self {
        match self {
            Self::Initialization(_) => self,
            other => Self::Initialization(Box::new(other)),
        }
    }

    /// Whether the error was raised before contacting the gateway.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::ConfigLoad { .. }
            | Self::MissingField(_)
            | Self::InvalidConfig(_)
            | Self::KeyStore(_) => true,
            Self::Initialization(inner) => inner.is_configuration(),
            _ => false,
        }
    }
}
