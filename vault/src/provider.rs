//! Decryptor abstraction.
//!
//! The pool hook only needs "ciphertext in, plaintext out"; anything that
//! can do that (the gateway client, a test double) implements [`Decryptor`].

use crate::error::VaultResult;
use async_trait::async_trait;
use secrecy::SecretString;

/// Turns a stored ciphertext into its plaintext.
#[async_trait]
pub trait Decryptor: Send + Sync {
    /// Decrypt one ciphertext.
    async fn decrypt(&self, ciphertext: &str) -> VaultResult<SecretString>;
}
