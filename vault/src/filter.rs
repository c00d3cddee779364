//! Pool integration hook.
//!
//! On pool initialization the stored ciphertext password is decrypted and
//! substituted. Resolution and application are separate steps:
//! [`VaultFilter::resolve_password`] only reads the pool, and
//! [`ResolvedPassword::apply`] performs the write. [`VaultFilter::init`]
//! does both.
//!
//! The ciphertext is taken from the first non-blank of:
//! 1. the `password` entry of the supplied properties map
//! 2. the `password` entry of the pool's connect properties
//! 3. the pool's own password

use crate::{
    config::ProcessSettings,
    error::{VaultError, VaultResult},
    provider::Decryptor,
    resolver::CredentialResolver,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use vault_filter_common::Properties;

/// Password property name.
pub const PROP_PASSWORD: &str = "password";
/// Connect property naming the config resource.
pub const PROP_CONFIG_FILE: &str = "config.file";
/// Config resource used when nothing else names one.
pub const DEFAULT_CONFIG_FILE: &str = "classpath:vault.properties";

/// What the pool exposes to the filter.
pub trait DataSourceConfig {
    /// Current pool password.
    fn password(&self) -> Option<&str>;

    /// Replace the pool password.
    fn set_password(&mut self, password: String);

    /// Connection properties passed to the driver.
    fn connect_properties(&self) -> &Properties;
}

/// Plain pool settings, for callers without their own pool type.
#[derive(Debug, Clone, Default)]
pub struct DataSourceSettings {
    /// Pool password
    pub password: Option<String>,
    /// Connection properties
    pub connect_properties: Properties,
}

impl DataSourceSettings {
    /// Create settings with the given password.
    #[must_use]
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            connect_properties: Properties::new(),
        }
    }
}

impl DataSourceConfig for DataSourceSettings {
    fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    fn set_password(&mut self, password: String) {
        self.password = Some(password);
    }

    fn connect_properties(&self) -> &Properties {
        &self.connect_properties
    }
}

/// Where a resolved password should be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordTarget {
    /// The properties map supplied with the init call
    Properties,
    /// The pool itself
    DataSource,
}

/// A decrypted password and where it belongs.
#[derive(Debug)]
pub struct ResolvedPassword {
    plaintext: SecretString,
    target: PasswordTarget,
}

impl ResolvedPassword {
    /// Pair a plaintext with its target.
    #[must_use]
    pub const fn new(plaintext: SecretString, target: PasswordTarget) -> Self {
        Self { plaintext, target }
    }

    /// Where the password should be written.
    #[must_use]
    pub const fn target(&self) -> PasswordTarget {
        self.target
    }

    /// The decrypted password.
    #[must_use]
    pub const fn plaintext(&self) -> &SecretString {
        &self.plaintext
    }

    /// Write the password to its target.
    ///
    /// A [`PasswordTarget::Properties`] password with no map given falls
    /// back to the pool.
    pub fn apply<D: DataSourceConfig + ?Sized>(self, data_source: &mut D, info: Option<&mut Properties>) {
        let plaintext = self.plaintext.expose_secret();
        match (self.target, info) {
            (PasswordTarget::Properties, Some(info)) => {
                info.set(PROP_PASSWORD, plaintext);
            }
            _ => data_source.set_password(plaintext.to_string()),
        }
    }
}

/// Decrypts the pool password through the Vault gateway.
#[derive(Debug, Clone)]
pub struct VaultFilter {
    resolver: CredentialResolver,
    config_file: Option<String>,
}

impl VaultFilter {
    /// Create a filter around a resolver.
    #[must_use]
    pub const fn new(resolver: CredentialResolver) -> Self {
        Self {
            resolver,
            config_file: None,
        }
    }

    /// Create a filter from environment settings.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(CredentialResolver::new(ProcessSettings::from_env()))
    }

    /// Use an explicit config resource, overriding pool and environment.
    #[must_use]
    pub fn with_config_file(mut self, location: impl Into<String>) -> Self {
        self.config_file = Some(location.into());
        self
    }

    /// The resolver in use.
    #[must_use]
    pub const fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    /// Config resource for a pool.
    ///
    /// Checked in order: the filter's own setting, the pool's `config.file`
    /// connect property, the [`crate::config::CONFIG_FILE_ENV`] setting, then
    /// [`DEFAULT_CONFIG_FILE`].
    #[must_use]
    pub fn config_location<D: DataSourceConfig + ?Sized>(&self, data_source: &D) -> String {
        self.config_file
            .as_deref()
            .or_else(|| data_source.connect_properties().get_non_empty(PROP_CONFIG_FILE))
            .or_else(|| self.resolver.settings().config_file())
            .unwrap_or(DEFAULT_CONFIG_FILE)
            .to_string()
    }

    /// Decrypt the pool's ciphertext without modifying anything.
    ///
    /// # Errors
    ///
    /// Every failure is wrapped in [`VaultError::Initialization`]; the pool
    /// must not start.
    pub async fn resolve_password<D: DataSourceConfig + ?Sized>(
        &self,
        data_source: &D,
        info: Option<&Properties>,
    ) -> VaultResult<ResolvedPassword> {
        let resolve = async {
            let ciphertext = locate_ciphertext(data_source, info)?;
            let location = self.config_location(data_source);
            info!(location = %location, "Decrypting pool password");

            let plaintext = self.resolver.resolve(&location, ciphertext).await?;
            Ok::<_, VaultError>(ResolvedPassword::new(plaintext, target_for(info)))
        };

        self.resolver
            .scoped(resolve)
            .await
            .map_err(VaultError::into_initialization)
    }

    /// Decrypt and substitute the pool password.
    ///
    /// Writes to `info` when given, otherwise to the pool. On error nothing
    /// is written.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_password`].
    pub async fn init<D: DataSourceConfig + ?Sized>(
        &self,
        data_source: &mut D,
        mut info: Option<&mut Properties>,
    ) -> VaultResult<()> {
        let resolved = self.resolve_password(&*data_source, info.as_deref()).await?;
        debug!(destination = ?resolved.target(), "Substituting decrypted password");
        resolved.apply(data_source, info.as_deref_mut());
        Ok(())
    }
}

/// Resolve the pool password with any [`Decryptor`].
///
/// # Errors
///
/// Every failure is wrapped in [`VaultError::Initialization`].
pub async fn resolve_with<D: DataSourceConfig + ?Sized>(
    decryptor: &dyn Decryptor,
    data_source: &D,
    info: Option<&Properties>,
) -> VaultResult<ResolvedPassword> {
    let resolve = async {
        let ciphertext = locate_ciphertext(data_source, info)?;
        let plaintext = decryptor.decrypt(ciphertext).await?;
        Ok::<_, VaultError>(ResolvedPassword::new(plaintext, target_for(info)))
    };
    resolve.await.map_err(VaultError::into_initialization)
}

/// Find the stored ciphertext, returned exactly as stored.
///
/// # Errors
///
/// Returns [`VaultError::MissingField`] if no source holds a non-blank
/// password.
pub fn locate_ciphertext<'a, D: DataSourceConfig + ?Sized>(
    data_source: &'a D,
    info: Option<&'a Properties>,
) -> VaultResult<&'a str> {
    non_blank(info.and_then(|props| props.get(PROP_PASSWORD)))
        .or_else(|| non_blank(data_source.connect_properties().get(PROP_PASSWORD)))
        .or_else(|| non_blank(data_source.password()))
        .ok_or(VaultError::MissingField(PROP_PASSWORD))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

const fn target_for(info: Option<&Properties>) -> PasswordTarget {
    if info.is_some() {
        PasswordTarget::Properties
    } else {
        PasswordTarget::DataSource
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(password: Option<&str>, connect: &[(&str, &str)]) -> DataSourceSettings {
        DataSourceSettings {
            password: password.map(str::to_string),
            connect_properties: connect.iter().copied().collect(),
        }
    }

    #[test]
    fn test_locate_prefers_info() {
        let ds = settings_with(Some("pool"), &[(PROP_PASSWORD, "connect")]);
        let info: Properties = [(PROP_PASSWORD, "info")].into_iter().collect();
        assert_eq!(locate_ciphertext(&ds, Some(&info)).unwrap(), "info");
    }

    #[test]
    fn test_locate_falls_back_to_connect_properties_then_pool() {
        let ds = settings_with(Some("pool"), &[(PROP_PASSWORD, "connect")]);
        let blank_info: Properties = [(PROP_PASSWORD, " ")].into_iter().collect();
        assert_eq!(locate_ciphertext(&ds, Some(&blank_info)).unwrap(), "connect");

        let ds = settings_with(Some("pool"), &[]);
        assert_eq!(locate_ciphertext(&ds, None).unwrap(), "pool");
    }

    #[test]
    fn test_locate_keeps_value_untrimmed() {
        let ds = settings_with(Some(" vault:v1:pool\t"), &[]);
        assert_eq!(locate_ciphertext(&ds, None).unwrap(), " vault:v1:pool\t");

        let info: Properties = [(PROP_PASSWORD, "vault:v1:info ")].into_iter().collect();
        assert_eq!(locate_ciphertext(&ds, Some(&info)).unwrap(), "vault:v1:info ");
    }

    #[test]
    fn test_locate_missing_everywhere() {
        let ds = settings_with(Some(""), &[]);
        assert!(matches!(
            locate_ciphertext(&ds, None),
            Err(VaultError::MissingField(PROP_PASSWORD))
        ));
    }

    #[test]
    fn test_apply_to_info() {
        let mut ds = settings_with(Some("cipher"), &[]);
        let mut info = Properties::new();
        ResolvedPassword::new(SecretString::from("plain"), PasswordTarget::Properties)
            .apply(&mut ds, Some(&mut info));

        assert_eq!(info.get(PROP_PASSWORD), Some("plain"));
        assert_eq!(ds.password(), Some("cipher"));
    }

    #[test]
    fn test_apply_to_data_source() {
        let mut ds = settings_with(Some("cipher"), &[]);
        ResolvedPassword::new(SecretString::from("plain"), PasswordTarget::DataSource)
            .apply(&mut ds, None);
        assert_eq!(ds.password(), Some("plain"));
    }

    #[test]
    fn test_config_location_precedence() {
        let resolver = CredentialResolver::new(
            ProcessSettings::default().with_config_file("file:///etc/vault/env.properties"),
        );
        let filter = VaultFilter::new(resolver.clone());

        let plain = settings_with(Some("c"), &[]);
        assert_eq!(filter.config_location(&plain), "file:///etc/vault/env.properties");

        let with_prop = settings_with(Some("c"), &[(PROP_CONFIG_FILE, "classpath:pool.properties")]);
        assert_eq!(filter.config_location(&with_prop), "classpath:pool.properties");

        let explicit = filter.with_config_file("/opt/vault.properties");
        assert_eq!(explicit.config_location(&with_prop), "/opt/vault.properties");

        let bare = VaultFilter::new(CredentialResolver::new(ProcessSettings::default()));
        assert_eq!(bare.config_location(&plain), DEFAULT_CONFIG_FILE);
    }
}
