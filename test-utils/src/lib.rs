//! Shared test utilities for the Vault credential filter.
//!
//! This crate provides:
//! - A wiremock-backed mock transit gateway
//! - Config resource fixtures in temporary directories
//! - Proptest generators for ciphertexts, plaintexts and key paths

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use fixtures::*;
pub use generators::*;
pub use mocks::MockTransitGateway;
