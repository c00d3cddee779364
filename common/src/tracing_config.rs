//! Tracing subscriber setup for binaries.
//!
//! Libraries in this workspace only emit events; installing a subscriber is
//! left to the process entry point. Events go to stderr so that stdout stays
//! free for command results.

use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// How log events are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Subscriber settings for a binary.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Filter directives used when `RUST_LOG` is not set
    pub default_filter: String,
    /// Event rendering
    pub format: LogFormat,
}

impl TracingConfig {
    /// Text output filtered by `default_filter` unless `RUST_LOG` overrides it.
    #[must_use]
    pub fn new(default_filter: impl Into<String>) -> Self {
        Self {
            default_filter: default_filter.into(),
            format: LogFormat::Text,
        }
    }

    /// Set the output format.
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Install the global subscriber.
///
/// A second call keeps the subscriber that is already installed.
pub fn init_tracing(config: &TracingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let output: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    if let Err(e) = tracing_subscriber::registry().with(output).with(filter).try_init() {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults_to_text() {
        let config = TracingConfig::new("vault_credential_filter=debug");
        assert_eq!(config.default_filter, "vault_credential_filter=debug");
        assert_eq!(config.format, LogFormat::Text);
        assert_eq!(config.with_format(LogFormat::Json).format, LogFormat::Json);
    }

    #[test]
    fn test_init_twice_keeps_first_subscriber() {
        init_tracing(&TracingConfig::new("warn").with_format(LogFormat::Json));
        init_tracing(&TracingConfig::new("debug"));
    }
}
