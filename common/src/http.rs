//! Centralized HTTP client configuration and building.
//!
//! Gateway sessions are short-lived, so the client is tuned for a handful of
//! requests rather than long-lived pooling.

use crate::PlatformError;
use reqwest::{Client, ClientBuilder, Identity};
use std::time::Duration;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout (default: 30s)
    pub timeout: Duration,
    /// Connection timeout (default: 10s)
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("vault-credential-filter/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Build a configured HTTP client.
///
/// Uses rustls. When `identity` is given it is presented as the TLS client
/// certificate on every connection.
///
/// # Errors
///
/// Returns [`PlatformError::Http`] if the client cannot be built (e.g., TLS
/// initialization fails).
///
/// # Examples
///
/// ```
/// use vault_filter_common::{HttpConfig, build_http_client};
/// use std::time::Duration;
///
/// let config = HttpConfig::default().with_timeout(Duration::from_secs(5));
/// let client = build_http_client(&config, None).expect("Failed to build client");
/// ```
pub fn build_http_client(
    config: &HttpConfig,
    identity: Option<Identity>,
) -> Result<Client, PlatformError> {
    let mut builder = ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(&config.user_agent)
        .use_rustls_tls();

    if let Some(identity) = identity {
        builder = builder.identity(identity);
    }

    Ok(builder.build()?)
}
