//! Vault credential filter for connection pools.
//!
//! At pool initialization the stored ciphertext password is sent to a Vault
//! transit gateway for decryption and the plaintext substituted back into
//! the pool.
//!
//! ```no_run
//! use vault_credential_filter::{DataSourceSettings, VaultFilter};
//!
//! # async fn run() -> vault_credential_filter::VaultResult<()> {
//! let mut pool = DataSourceSettings::with_password("vault:v1:8SDd3WHDOjf7mq69...");
//! VaultFilter::from_env()
//!     .with_config_file("classpath:vault.properties")
//!     .init(&mut pool, None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod provider;
pub mod resolver;
pub mod transit;

pub use client::VaultClient;
pub use config::{AuthType, ProcessSettings, VaultConfig};
pub use error::{VaultError, VaultResult};
pub use filter::{DataSourceConfig, DataSourceSettings, PasswordTarget, ResolvedPassword, VaultFilter};
pub use provider::Decryptor;
pub use resolver::CredentialResolver;
pub use vault_filter_common::Properties;
