//! Shared library for the Vault credential filter.
//!
//! This crate provides:
//! - Error types for resource and client failures
//! - Java-style properties parsing
//! - `file://` / `classpath:` resource resolution
//! - HTTP client configuration and building
//! - Tracing subscriber setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod properties;
pub mod resource;
pub mod tracing_config;

pub use error::PlatformError;
pub use http::{HttpConfig, build_http_client};
pub use properties::Properties;
pub use resource::{CLASSPATH_ENV, ResourceLoader, ResourceLocation};
pub use tracing_config::{LogFormat, TracingConfig, init_tracing};
