//! Gateway request and response bodies.

use serde::{Deserialize, Serialize};

/// Transit decrypt request body.
#[derive(Debug, Serialize)]
pub struct DecryptRequest<'a> {
    /// Ciphertext as stored in pool config, e.g. `vault:v1:...`
    pub ciphertext: &'a str,
}

/// Transit decrypt response.
#[derive(Debug, Deserialize)]
pub struct DecryptResponse {
    /// Absent when the gateway answers without a data section
    #[serde(default)]
    pub data: Option<DecryptData>,
}

/// Data section of a transit decrypt response.
#[derive(Deserialize)]
pub struct DecryptData {
    /// Base64-encoded plaintext
    #[serde(default)]
    pub plaintext: Option<String>,
}

impl std::fmt::Debug for DecryptData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptData")
            .field("plaintext", &self.plaintext.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Certificate login request body.
#[derive(Debug, Serialize)]
pub struct CertLoginRequest<'a> {
    /// Certificate role to log in against; the gateway picks one when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
}

/// Vault auth response.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    /// Auth section
    pub auth: AuthData,
}

/// Auth section of a login response.
#[derive(Deserialize)]
pub struct AuthData {
    /// Session token
    pub client_token: String,
    /// Token policies
    #[serde(default)]
    pub policies: Vec<String>,
    /// Token TTL in seconds
    #[serde(default)]
    pub lease_duration: u64,
}

impl std::fmt::Debug for AuthData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthData")
            .field("client_token", &"[REDACTED]")
            .field("policies", &self.policies)
            .field("lease_duration", &self.lease_duration)
            .finish()
    }
}

/// Error body returned by the gateway on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    /// Error messages
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ErrorResponse {
    /// Best-effort message from a raw error body.
    #[must_use]
    pub fn message(body: &str) -> String {
        serde_json::from_str::<Self>(body)
            .ok()
            .filter(|e| !e.errors.is_empty())
            .map_or_else(|| body.trim().to_string(), |e| e.errors.join("; "))
    }
}
