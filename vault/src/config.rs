//! Vault client configuration.
//!
//! A config file is a properties resource using the version 1 schema:
//!
//! ```properties
//! vault.config.version=1
//! vault.gateway=https://vault.internal:8200
//! vault.auth.type=token
//! vault.auth.token=s.xxxxx
//! vault.decrypt.key=transit/decrypt/orders-db
//! ```
//!
//! Keystore and config file locations are process-wide settings and come
//! from [`ProcessSettings`], never from the properties file.

use crate::error::{VaultError, VaultResult};
use secrecy::{ExposeSecret, SecretString};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use vault_filter_common::{CLASSPATH_ENV, Properties, ResourceLoader};

/// Schema version key.
pub const KEY_CONFIG_VERSION: &str = "vault.config.version";
/// Gateway URL key.
pub const KEY_GATEWAY: &str = "vault.gateway";
/// Auth type key (`token` or `cert`).
pub const KEY_AUTH_TYPE: &str = "vault.auth.type";
/// Token key for token auth.
pub const KEY_AUTH_TOKEN: &str = "vault.auth.token";
/// Optional role name for cert auth.
pub const KEY_CERT_ROLE: &str = "vault.auth.cert.role";
/// Transit decrypt path key.
pub const KEY_DECRYPT_KEY: &str = "vault.decrypt.key";
/// Request timeout key, in seconds.
pub const KEY_TIMEOUT_SECS: &str = "vault.timeout.secs";

/// The only schema version understood.
pub const CONFIG_VERSION: u32 = 1;

/// Client identity (PEM certificate and key) for cert auth.
pub const KEYSTORE_ENV: &str = "VAULT_CLIENT_SSL_KEYSTORE";
/// Password for an encrypted private key in the keystore.
pub const KEYSTORE_PASSWORD_ENV: &str = "VAULT_CLIENT_SSL_KEYSTORE_PASSWORD";
/// Default config resource location override.
pub const CONFIG_FILE_ENV: &str = "VAULT_FILTER_CONFIG_FILE";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How the client authenticates to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthType {
    /// Static token sent as `X-Vault-Token`
    #[default]
    Token,
    /// TLS client certificate login
    Cert,
}

impl AuthType {
    /// Config value for this auth type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Cert => "cert",
        }
    }
}

impl FromStr for AuthType {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token" => Ok(Self::Token),
            "cert" => Ok(Self::Cert),
            other => Err(VaultError::invalid_config(format!(
                "unsupported {KEY_AUTH_TYPE} '{other}', expected 'token' or 'cert'"
            ))),
        }
    }
}

/// Validated gateway configuration.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    gateway: Url,
    auth_type: AuthType,
    token: Option<SecretString>,
    cert_role: Option<String>,
    decrypt_key_path: String,
    timeout: Duration,
}

impl VaultConfig {
    /// Build a configuration from explicit values.
    ///
    /// # Errors
    ///
    /// Fails if the gateway is blank or not an http(s) URL, the decrypt key
    /// path is blank, or token auth is chosen without a non-blank token.
    pub fn new(
        gateway: &str,
        auth_type: AuthType,
        decrypt_key_path: &str,
        token: Option<SecretString>,
    ) -> VaultResult<Self> {
        let gateway = parse_gateway(gateway)?;

        let decrypt_key_path = decrypt_key_path.trim().trim_matches('/');
        if decrypt_key_path.is_empty() {
            return Err(VaultError::MissingField(KEY_DECRYPT_KEY));
        }

        let token = token.filter(|t| !t.expose_secret().trim().is_empty());
        if auth_type == AuthType::Token && token.is_none() {
            return Err(VaultError::MissingField(KEY_AUTH_TOKEN));
        }

        Ok(Self {
            gateway,
            auth_type,
            token,
            cert_role: None,
            decrypt_key_path: decrypt_key_path.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Build a configuration from a parsed properties resource.
    ///
    /// # Errors
    ///
    /// Fails on an unsupported schema version or auth type, a bad timeout,
    /// or any of the conditions listed on [`VaultConfig::new`].
    pub fn from_properties(props: &Properties) -> VaultResult<Self> {
        if let Some(version) = props.get_non_empty(KEY_CONFIG_VERSION) {
            if version.parse::<u32>().ok() != Some(CONFIG_VERSION) {
                return Err(VaultError::invalid_config(format!(
                    "unsupported {KEY_CONFIG_VERSION} '{version}', expected {CONFIG_VERSION}"
                )));
            }
        }

        let gateway = props
            .get_non_empty(KEY_GATEWAY)
            .ok_or(VaultError::MissingField(KEY_GATEWAY))?;
        let auth_type = props
            .get_non_empty(KEY_AUTH_TYPE)
            .map_or(Ok(AuthType::default()), str::parse)?;
        let decrypt_key_path = props
            .get_non_empty(KEY_DECRYPT_KEY)
            .ok_or(VaultError::MissingField(KEY_DECRYPT_KEY))?;
        let token = props.get(KEY_AUTH_TOKEN).map(SecretString::from);

        let mut config = Self::new(gateway, auth_type, decrypt_key_path, token)?;
        config.cert_role = props.get_non_empty(KEY_CERT_ROLE).map(str::to_string);

        if let Some(secs) = props.get_non_empty(KEY_TIMEOUT_SECS) {
            let secs = secs
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| {
                    VaultError::invalid_config(format!("invalid {KEY_TIMEOUT_SECS} '{secs}'"))
                })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the role name sent with cert login.
    #[must_use]
    pub fn with_cert_role(mut self, role: impl Into<String>) -> Self {
        self.cert_role = Some(role.into());
        self
    }

    /// Gateway base URL.
    #[must_use]
    pub const fn gateway(&self) -> &Url {
        &self.gateway
    }

    /// Auth type.
    #[must_use]
    pub const fn auth_type(&self) -> AuthType {
        self.auth_type
    }

    /// Token, present for token auth.
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Cert login role name.
    #[must_use]
    pub fn cert_role(&self) -> Option<&str> {
        self.cert_role.as_deref()
    }

    /// Transit decrypt path without leading or trailing slashes.
    #[must_use]
    pub fn decrypt_key_path(&self) -> &str {
        &self.decrypt_key_path
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full URL of a gateway API path.
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.gateway.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_gateway(gateway: &str) -> VaultResult<Url> {
    let gateway = gateway.trim();
    if gateway.is_empty() {
        return Err(VaultError::MissingField(KEY_GATEWAY));
    }

    let url = Url::parse(gateway)
        .map_err(|e| VaultError::invalid_config(format!("invalid {KEY_GATEWAY} '{gateway}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(VaultError::invalid_config(format!(
            "unsupported {KEY_GATEWAY} scheme '{scheme}'"
        ))),
    }
}

/// Process-wide settings, read once from the environment.
#[derive(Debug, Clone, Default)]
pub struct ProcessSettings {
    keystore: Option<PathBuf>,
    keystore_password: Option<SecretString>,
    config_file: Option<String>,
    classpath: Option<OsString>,
}

impl ProcessSettings {
    /// Read settings from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through a lookup function.
    ///
    /// Blank values count as unset. The keystore password is taken verbatim
    /// and only an empty one counts as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            keystore: get(KEYSTORE_ENV).map(PathBuf::from),
            keystore_password: lookup(KEYSTORE_PASSWORD_ENV)
                .filter(|v| !v.is_empty())
                .map(SecretString::from),
            config_file: get(CONFIG_FILE_ENV),
            classpath: get(CLASSPATH_ENV).map(OsString::from),
        }
    }

    /// Set the keystore path.
    #[must_use]
    pub fn with_keystore(mut self, path: impl Into<PathBuf>) -> Self {
        self.keystore = Some(path.into());
        self
    }

    /// Set the keystore password.
    #[must_use]
    pub fn with_keystore_password(mut self, password: impl Into<String>) -> Self {
        self.keystore_password = Some(SecretString::from(password.into()));
        self
    }

    /// Set the default config file location.
    #[must_use]
    pub fn with_config_file(mut self, location: impl Into<String>) -> Self {
        self.config_file = Some(location.into());
        self
    }

    /// Set the classpath roots.
    #[must_use]
    pub fn with_classpath<P: Into<PathBuf>>(mut self, roots: impl IntoIterator<Item = P>) -> Self {
        let roots: Vec<PathBuf> = roots.into_iter().map(Into::into).collect();
        self.classpath = std::env::join_paths(roots).ok();
        self
    }

    /// Keystore path, if configured.
    #[must_use]
    pub fn keystore(&self) -> Option<&Path> {
        self.keystore.as_deref()
    }

    /// Keystore path, required for cert auth.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::KeyStore`] when no keystore is configured.
    pub fn require_keystore(&self) -> VaultResult<&Path> {
        self.keystore()
            .ok_or_else(|| VaultError::KeyStore(format!("{KEYSTORE_ENV} is not set")))
    }

    /// Keystore password, if configured.
    #[must_use]
    pub const fn keystore_password(&self) -> Option<&SecretString> {
        self.keystore_password.as_ref()
    }

    /// Default config file location, if configured.
    #[must_use]
    pub fn config_file(&self) -> Option<&str> {
        self.config_file.as_deref()
    }

    /// Resource loader over the configured classpath.
    #[must_use]
    pub fn resource_loader(&self) -> ResourceLoader {
        ResourceLoader::from_classpath(self.classpath.clone())
    }
}
