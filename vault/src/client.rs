//! Vault HTTP client for transit decryption.
//!
//! A client is one authenticated session. It is built, used for a decrypt
//! and dropped; nothing is cached between sessions.

use crate::{
    config::{AuthType, KEY_AUTH_TOKEN, KEYSTORE_PASSWORD_ENV, ProcessSettings, VaultConfig},
    error::{VaultError, VaultResult},
    provider::Decryptor,
    transit::{AuthResponse, CertLoginRequest, DecryptRequest, DecryptResponse, ErrorResponse},
};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use pkcs8::{
    Document, EncryptedPrivateKeyInfo, LineEnding, PrivateKeyInfo, der::pem::PemLabel,
};
use reqwest::{Client, Identity, Response};
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use vault_filter_common::{HttpConfig, build_http_client};
use zeroize::Zeroizing;

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "X-Vault-Token";

/// Certificate auth login path.
pub const CERT_LOGIN_PATH: &str = "auth/cert/login";

const ENCRYPTED_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";

/// Authenticated gateway session.
pub struct VaultClient {
    config: VaultConfig,
    http: Client,
    token: SecretString,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("config", &self.config)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl VaultClient {
    /// Build an authenticated session.
    ///
    /// Token auth uses the configured token as-is. Cert auth loads the client
    /// identity from the keystore in `settings` and logs in with it. An
    /// encrypted PKCS#8 key in the keystore is opened with the keystore
    /// password. A missing or unusable keystore, or a missing or wrong
    /// password, fails before any request is sent.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::KeyStore`] for keystore problems,
    /// [`VaultError::AuthenticationFailed`] if cert login is rejected and
    /// [`VaultError::Unavailable`] if the gateway cannot be reached.
    #[instrument(skip_all, fields(gateway = %config.gateway(), auth_type = config.auth_type().as_str()))]
    pub async fn connect(config: VaultConfig, settings: &ProcessSettings) -> VaultResult<Self> {
        let http_config = HttpConfig::default().with_timeout(config.timeout());

        let (http, token) = match config.auth_type() {
            AuthType::Token => {
                let token = config
                    .token()
                    .cloned()
                    .ok_or(VaultError::MissingField(KEY_AUTH_TOKEN))?;
                (build_http_client(&http_config, None)?, token)
            }
            AuthType::Cert => {
                let identity =
                    load_identity(settings.require_keystore()?, settings.keystore_password()).await?;
                let http = build_http_client(&http_config, Some(identity)).map_err(|e| {
                    VaultError::KeyStore(format!("client identity rejected: {e}"))
                })?;
                let token = cert_login(&http, &config).await?;
                (http, token)
            }
        };

        debug!("Vault session ready");
        Ok(Self {
            config,
            http,
            token,
        })
    }

    /// Configuration this session was built from.
    #[must_use]
    pub const fn config(&self) -> &VaultConfig {
        &self.config
    }
}

#[async_trait]
impl Decryptor for VaultClient {
    #[instrument(skip(self, ciphertext), fields(key = %self.config.decrypt_key_path()))]
    async fn decrypt(&self, ciphertext: &str) -> VaultResult<SecretString> {
        let path = self.config.decrypt_key_path();
        let url = self.config.api_url(path);

        let response = self
            .http
            .post(&url)
            .header(TOKEN_HEADER, self.token.expose_secret())
            .json(&DecryptRequest { ciphertext })
            .send()
            .await
            .map_err(|e| VaultError::Decrypt(format!("request to {path} failed: {e}")))?;

        let response = check_status(response, path).await?;
        let body: DecryptResponse = response
            .json()
            .await
            .map_err(|e| VaultError::malformed(format!("decrypt response: {e}")))?;

        let encoded = body
            .data
            .and_then(|data| data.plaintext)
            .map(Zeroizing::new)
            .ok_or_else(|| VaultError::malformed("decrypt response has no data.plaintext"))?;

        let plaintext = decode_plaintext(&encoded)?;
        debug!("Ciphertext decrypted");
        Ok(plaintext)
    }
}

/// Decode the base64 plaintext field of a transit response.
///
/// # Errors
///
/// Returns [`VaultError::MalformedResponse`] if the value is not base64 or
/// does not decode to UTF-8.
pub fn decode_plaintext(encoded: &str) -> VaultResult<SecretString> {
    let bytes = Zeroizing::new(
        STANDARD
            .decode(encoded.trim())
            .map_err(|e| VaultError::malformed(format!("plaintext is not base64: {e}")))?,
    );
    let text = std::str::from_utf8(&bytes)
        .map_err(|e| VaultError::malformed(format!("plaintext is not UTF-8: {e}")))?;
    Ok(SecretString::from(text))
}

async fn load_identity(keystore: &Path, password: Option<&SecretString>) -> VaultResult<Identity> {
    let raw = Zeroizing::new(tokio::fs::read(keystore).await.map_err(|e| {
        VaultError::KeyStore(format!("cannot read {}: {e}", keystore.display()))
    })?);
    let text = std::str::from_utf8(&raw).map_err(|e| {
        VaultError::KeyStore(format!("{} is not PEM: {e}", keystore.display()))
    })?;

    let bundle = match pem_block(text, ENCRYPTED_KEY_LABEL) {
        Some(block) => {
            let password = password.ok_or_else(|| {
                VaultError::KeyStore(format!(
                    "{} holds an encrypted key but {KEYSTORE_PASSWORD_ENV} is not set",
                    keystore.display()
                ))
            })?;
            let key = decrypt_private_key(block, password).map_err(|e| {
                VaultError::KeyStore(format!("cannot decrypt key in {}: {e}", keystore.display()))
            })?;
            Zeroizing::new(text.replacen(block, &key, 1))
        }
        None => Zeroizing::new(text.to_owned()),
    };

    Identity::from_pem(bundle.as_bytes()).map_err(|e| {
        VaultError::KeyStore(format!("invalid identity in {}: {e}", keystore.display()))
    })
}

/// The first PEM block with `label`, armor lines included.
fn pem_block<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");
    let start = text.find(&begin)?;
    let stop = start + text[start..].find(&end)? + end.len();
    Some(&text[start..stop])
}

/// Decrypt a PBES2 `ENCRYPTED PRIVATE KEY` block into a plain PKCS#8 block.
fn decrypt_private_key(block: &str, password: &SecretString) -> pkcs8::Result<Zeroizing<String>> {
    let (_, document) = Document::from_pem(block)?;
    let info = EncryptedPrivateKeyInfo::try_from(document.as_bytes())?;
    let key = info.decrypt(password.expose_secret())?;
    Ok(key.to_pem(PrivateKeyInfo::PEM_LABEL, LineEnding::LF)?)
}

async fn cert_login(http: &Client, config: &VaultConfig) -> VaultResult<SecretString> {
    let url = config.api_url(CERT_LOGIN_PATH);
    let body = CertLoginRequest {
        name: config.cert_role(),
    };

    let response = http
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| VaultError::unavailable(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        warn!(%status, "Certificate login rejected");
        return Err(VaultError::auth_failed(format!(
            "Status {status}: {}",
            ErrorResponse::message(&text)
        )));
    }

    let auth: AuthResponse = response
        .json()
        .await
        .map_err(|e| VaultError::malformed(format!("login response: {e}")))?;

    info!(
        ttl_secs = auth.auth.lease_duration,
        policies = ?auth.auth.policies,
        "Authenticated with client certificate"
    );
    Ok(SecretString::from(auth.auth.client_token))
}

async fn check_status(response: Response, path: &str) -> VaultResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let detail = ErrorResponse::message(&text);
    warn!(%status, path, "Transit request failed");

    Err(match status.as_u16() {
        403 => VaultError::PermissionDenied(path.to_string()),
        404 => VaultError::NotFound(path.to_string()),
        s if s >= 500 => VaultError::unavailable(format!("Status {status}: {detail}")),
        _ => VaultError::Decrypt(format!("Status {status}: {detail}")),
    })
}
