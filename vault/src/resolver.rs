//! Credential resolution: config resource to plaintext.
//!
//! Each call re-reads the config resource and opens a fresh session.
//! Log output goes to the dispatcher held by the resolver, so callers can
//! route it wherever they like (or capture it in tests).

use crate::{
    client::VaultClient,
    config::{ProcessSettings, VaultConfig},
    error::{VaultError, VaultResult},
    provider::Decryptor,
};
use secrecy::SecretString;
use std::future::Future;
use tracing::{Dispatch, dispatcher, error, info, instrument::WithSubscriber};

/// Resolves ciphertexts using a config resource and process settings.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    settings: ProcessSettings,
    dispatch: Dispatch,
}

impl CredentialResolver {
    /// Create a resolver that logs to the current default dispatcher.
    #[must_use]
    pub fn new(settings: ProcessSettings) -> Self {
        Self {
            settings,
            dispatch: dispatcher::get_default(Dispatch::clone),
        }
    }

    /// Create a resolver from environment settings.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ProcessSettings::from_env())
    }

    /// Route log output to `dispatch`.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: impl Into<Dispatch>) -> Self {
        self.dispatch = dispatch.into();
        self
    }

    /// Process settings in use.
    #[must_use]
    pub const fn settings(&self) -> &ProcessSettings {
        &self.settings
    }

    /// Dispatcher receiving log output.
    #[must_use]
    pub const fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Run `fut` with this resolver's dispatcher.
    pub(crate) async fn scoped<F: Future>(&self, fut: F) -> F::Output {
        fut.with_subscriber(self.dispatch.clone()).await
    }

    /// Load and validate the config resource at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::ConfigLoad`] if the resource cannot be read or
    /// parsed, or a validation error from [`VaultConfig::from_properties`].
    pub async fn load_config(&self, location: &str) -> VaultResult<VaultConfig> {
        self.scoped(self.load_config_inner(location)).await
    }

    /// Load config and open an authenticated session.
    ///
    /// # Errors
    ///
    /// Any error from [`Self::load_config`] or [`VaultClient::connect`].
    pub async fn connect(&self, location: &str) -> VaultResult<VaultClient> {
        let connect = async {
            let config = self.load_config_inner(location).await?;
            VaultClient::connect(config, &self.settings).await
        };
        self.scoped(connect).await
    }

    /// Decrypt `ciphertext` using the config resource at `location`.
    ///
    /// # Errors
    ///
    /// Config, authentication and decrypt failures are all returned as-is;
    /// nothing is retried.
    pub async fn resolve(&self, location: &str, ciphertext: &str) -> VaultResult<SecretString> {
        self.scoped(async {
            let result: VaultResult<SecretString> = async {
                let config = self.load_config_inner(location).await?;
                info!(
                    location,
                    gateway = %config.gateway(),
                    auth_type = config.auth_type().as_str(),
                    "Resolving credential"
                );
                let client = VaultClient::connect(config, &self.settings).await?;
                client.decrypt(ciphertext).await
            }
            .await;

            if let Err(e) = &result {
                error!(location, error = %e, "Credential resolution failed");
            }
            result
        })
        .await
    }

    async fn load_config_inner(&self, location: &str) -> VaultResult<VaultConfig> {
        let props = self
            .settings
            .resource_loader()
            .load_properties(location)
            .await
            .map_err(|e| VaultError::config_load(location, e))?;
        VaultConfig::from_properties(&props)
    }
}
