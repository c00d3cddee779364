//! Mock transit gateway for testing.
//!
//! Wraps a [`wiremock::MockServer`] with the handful of Vault endpoints the
//! filter talks to. Requests that match no mounted mock get a 404.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token header name used by the gateway.
const TOKEN_HEADER: &str = "X-Vault-Token";

/// Mock Vault gateway.
pub struct MockTransitGateway {
    server: MockServer,
}

impl MockTransitGateway {
    /// Start a gateway on a random local port.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL, suitable for `vault.gateway`.
    #[must_use]
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Answer a decrypt of `ciphertext` with the base64 of `plaintext`.
    pub async fn expect_decrypt(&self, key_path: &str, token: &str, ciphertext: &str, plaintext: &str) {
        let body = decrypt_body(&STANDARD.encode(plaintext));
        self.expect_decrypt_response(
            key_path,
            token,
            ciphertext,
            ResponseTemplate::new(200).set_body_json(body),
        )
        .await;
    }

    /// Answer a decrypt of `ciphertext` with an arbitrary response.
    pub async fn expect_decrypt_response(
        &self,
        key_path: &str,
        token: &str,
        ciphertext: &str,
        response: ResponseTemplate,
    ) {
        Mock::given(method("POST"))
            .and(path(format!("/v1/{key_path}")))
            .and(header(TOKEN_HEADER, token))
            .and(body_json(json!({ "ciphertext": ciphertext })))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Answer cert logins with `client_token`.
    ///
    /// When `role` is given the login body must name it.
    pub async fn expect_cert_login(&self, role: Option<&str>, client_token: &str) {
        let expected = role.map_or_else(|| json!({}), |name| json!({ "name": name }));
        let body = json!({
            "auth": {
                "client_token": client_token,
                "accessor": "accessor-test",
                "policies": ["default", "transit-decrypt"],
                "token_policies": ["default", "transit-decrypt"],
                "lease_duration": 3600,
                "renewable": true
            }
        });

        Mock::given(method("POST"))
            .and(path("/v1/auth/cert/login"))
            .and(body_json(expected))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Reject cert logins with `status`.
    pub async fn reject_cert_login(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/v1/auth/cert/login"))
            .respond_with(ResponseTemplate::new(status).set_body_json(error_body("invalid certificate")))
            .mount(&self.server)
            .await;
    }

    /// Number of requests received so far.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}

/// Transit decrypt response carrying an already-encoded plaintext.
#[must_use]
pub fn decrypt_body(encoded_plaintext: &str) -> Value {
    json!({
        "request_id": "5a3e2f1c-0000-4000-8000-000000000000",
        "lease_id": "",
        "renewable": false,
        "lease_duration": 0,
        "data": { "plaintext": encoded_plaintext },
        "wrap_info": null,
        "warnings": null,
        "auth": null
    })
}

/// Gateway error body.
#[must_use]
pub fn error_body(message: &str) -> Value {
    json!({ "errors": [message] })
}
