//! Config resource fixtures.
//!
//! Each [`ConfigFixture`] owns a temporary directory that can serve both as
//! a classpath root and as a plain filesystem location.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Self-signed client certificate and key (P-256), PEM encoded.
pub const CLIENT_IDENTITY_PEM: &str = include_str!("../fixtures/client-identity.pem");

/// The same identity with its key as a PBES2 `ENCRYPTED PRIVATE KEY`.
pub const ENCRYPTED_CLIENT_IDENTITY_PEM: &str =
    include_str!("../fixtures/client-identity-encrypted.pem");

/// Password for [`ENCRYPTED_CLIENT_IDENTITY_PEM`].
pub const KEYSTORE_PASSWORD: &str = "keystore-secret";

/// Token used by gateway fixtures.
pub const TEST_TOKEN: &str = "s.test-token";

/// Decrypt path used by gateway fixtures.
pub const TEST_KEY_PATH: &str = "transit/decrypt/orders-db";

/// A temporary directory holding config resources.
#[derive(Debug)]
pub struct ConfigFixture {
    dir: TempDir,
}

impl ConfigFixture {
    /// Create an empty fixture directory.
    ///
    /// # Errors
    ///
    /// Fails if the temporary directory cannot be created.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Root of the fixture directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` at `relative`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be written.
    pub fn write(&self, relative: &str, contents: &str) -> io::Result<PathBuf> {
        let target = self.dir.path().join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, contents)?;
        Ok(target)
    }

    /// Write the test client identity and return its path.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be written.
    pub fn write_identity(&self) -> io::Result<PathBuf> {
        self.write("client-identity.pem", CLIENT_IDENTITY_PEM)
    }

    /// Write the password-protected client identity and return its path.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be written.
    pub fn write_encrypted_identity(&self) -> io::Result<PathBuf> {
        self.write("client-identity-encrypted.pem", ENCRYPTED_CLIENT_IDENTITY_PEM)
    }
}

/// Properties for token auth.
#[must_use]
pub fn token_config(gateway: &str, token: &str, key_path: &str) -> String {
    format!(
        "# transit decrypt, token auth\n\
         vault.config.version=1\n\
         vault.gateway={gateway}\n\
         vault.auth.type=token\n\
         vault.auth.token={token}\n\
         vault.decrypt.key={key_path}\n"
    )
}

/// Properties for cert auth.
#[must_use]
pub fn cert_config(gateway: &str, key_path: &str, role: Option<&str>) -> String {
    let mut config = format!(
        "vault.config.version=1\n\
         vault.gateway={gateway}\n\
         vault.auth.type=cert\n\
         vault.decrypt.key={key_path}\n"
    );
    if let Some(role) = role {
        config.push_str(&format!("vault.auth.cert.role={role}\n"));
    }
    config
}
