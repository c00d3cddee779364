//! Decrypt a single ciphertext through the configured Vault gateway.
//!
//! Useful for checking a config file and a stored pool password before
//! deploying them. With `--check` it only authenticates, which verifies the
//! config, keystore and gateway without needing a ciphertext.

use anyhow::Context;
use clap::Parser;
use secrecy::ExposeSecret;
use vault_credential_filter::{CredentialResolver, ProcessSettings, filter::DEFAULT_CONFIG_FILE};
use vault_filter_common::{LogFormat, TracingConfig, init_tracing};

#[derive(Debug, Parser)]
#[command(name = "vault-decrypt", version, about = "Decrypt a pool password through a Vault transit gateway")]
struct Cli {
    /// Config resource: file://<path>, classpath:<name> or a plain path
    /// [default: $VAULT_FILTER_CONFIG_FILE, then classpath:vault.properties]
    #[arg(short, long)]
    config: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Only authenticate against the gateway
    #[arg(long, conflicts_with = "ciphertext")]
    check: bool,

    /// Ciphertext as stored in the pool config, e.g. vault:v1:...
    #[arg(required_unless_present = "check")]
    ciphertext: Option<String>,
}

impl Cli {
    fn config_location(&self, settings: &ProcessSettings) -> String {
        self.config
            .as_deref()
            .or_else(|| settings.config_file())
            .unwrap_or(DEFAULT_CONFIG_FILE)
            .to_string()
    }

    fn tracing_config(&self) -> TracingConfig {
        let format = if self.json_logs {
            LogFormat::Json
        } else {
            LogFormat::Text
        };
        TracingConfig::new(&self.log_level).with_format(format)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.tracing_config());

    let resolver = CredentialResolver::from_env();
    let location = cli.config_location(resolver.settings());

    if cli.check {
        let client = resolver
            .connect(&location)
            .await
            .with_context(|| format!("failed to authenticate with config {location}"))?;
        println!(
            "authenticated to {} using {} auth",
            client.config().gateway(),
            client.config().auth_type().as_str()
        );
        return Ok(());
    }

    let ciphertext = cli.ciphertext.as_deref().context("a ciphertext is required")?;
    let plaintext = resolver
        .resolve(&location, ciphertext)
        .await
        .with_context(|| format!("failed to decrypt with config {location}"))?;

    println!("{}", plaintext.expose_secret());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_credential_filter::config::CONFIG_FILE_ENV;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("vault-decrypt").chain(args.iter().copied()))
    }

    fn env_settings(config_file: &str) -> ProcessSettings {
        let config_file = config_file.to_string();
        ProcessSettings::from_lookup(move |key| (key == CONFIG_FILE_ENV).then(|| config_file.clone()))
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = parse(&[
            "--config",
            "file:///etc/vault/vault.properties",
            "--log-level",
            "debug",
            "--json-logs",
            "vault:v1:abc",
        ])
        .unwrap();

        assert_eq!(cli.config.as_deref(), Some("file:///etc/vault/vault.properties"));
        assert_eq!(cli.log_level, "debug");
        assert!(cli.json_logs);
        assert!(!cli.check);
        assert_eq!(cli.ciphertext.as_deref(), Some("vault:v1:abc"));

        let tracing = cli.tracing_config();
        assert_eq!(tracing.default_filter, "debug");
        assert_eq!(tracing.format, LogFormat::Json);
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["vault:v1:abc"]).unwrap();

        assert_eq!(cli.log_level, "warn");
        assert!(!cli.json_logs);
        assert_eq!(cli.config_location(&ProcessSettings::default()), DEFAULT_CONFIG_FILE);
    }

    #[test]
    fn test_config_location_precedence() {
        let settings = env_settings("file:///opt/app/vault.properties");

        let cli = parse(&["vault:v1:abc"]).unwrap();
        assert_eq!(cli.config_location(&settings), "file:///opt/app/vault.properties");

        let cli = parse(&["-c", "classpath:other.properties", "vault:v1:abc"]).unwrap();
        assert_eq!(cli.config_location(&settings), "classpath:other.properties");
    }

    #[test]
    fn test_check_mode() {
        let cli = parse(&["--check"]).unwrap();
        assert!(cli.check);
        assert!(cli.ciphertext.is_none());

        assert!(parse(&[]).is_err());
        assert!(parse(&["--check", "vault:v1:abc"]).is_err());
    }
}
