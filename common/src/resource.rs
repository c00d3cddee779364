//! Resource resolution for config files.
//!
//! A location string is one of:
//! - `file://<path>`: filesystem path, falling back to the classpath
//! - `classpath:<name>`: looked up only under the classpath roots
//! - anything else: filesystem path, falling back to the classpath
//!
//! The classpath is a list of directories taken from
//! [`CLASSPATH_ENV`] and defaults to the current directory.

use crate::{PlatformError, Properties};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Environment variable holding the classpath roots, in platform path-list syntax.
pub const CLASSPATH_ENV: &str = "VAULT_FILTER_CLASSPATH";

const FILE_PREFIX: &str = "file://";
const CLASSPATH_PREFIX: &str = "classpath:";

/// A parsed resource location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLocation<'a> {
    /// `file://` prefixed path
    File(&'a str),
    /// `classpath:` prefixed name
    Classpath(&'a str),
    /// Bare path
    Path(&'a str),
}

impl<'a> ResourceLocation<'a> {
    /// Classify a location string by its prefix.
    #[must_use]
    pub fn parse(location: &'a str) -> Self {
        if let Some(path) = location.strip_prefix(FILE_PREFIX) {
            Self::File(path)
        } else if let Some(name) = location.strip_prefix(CLASSPATH_PREFIX) {
            Self::Classpath(name)
        } else {
            Self::Path(location)
        }
    }
}

/// Reads resources from the filesystem and the classpath roots.
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    roots: Vec<PathBuf>,
}

impl Default for ResourceLoader {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from(".")],
        }
    }
}

impl ResourceLoader {
    /// Create a loader with explicit classpath roots.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(roots: impl IntoIterator<Item = P>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a loader whose classpath comes from [`CLASSPATH_ENV`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_classpath(std::env::var_os(CLASSPATH_ENV))
    }

    /// Create a loader from a path-list value; `None` or an empty list
    /// falls back to the current directory.
    #[must_use]
    pub fn from_classpath(classpath: Option<OsString>) -> Self {
        let roots: Vec<PathBuf> = classpath
            .map(|value| {
                std::env::split_paths(&value)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if roots.is_empty() {
            Self::default()
        } else {
            Self { roots }
        }
    }

    /// Classpath roots in lookup order.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Read the raw bytes of a resource.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NotFound`] if no location holds the resource
    /// and [`PlatformError::Io`] if one exists but cannot be read.
    pub async fn read(&self, location: &str) -> Result<Vec<u8>, PlatformError> {
        let found = match ResourceLocation::parse(location) {
            ResourceLocation::File(path) | ResourceLocation::Path(path) => {
                match read_if_exists(Path::new(path)).await? {
                    Some(bytes) => Some(bytes),
                    None => self.read_classpath(path).await?,
                }
            }
            ResourceLocation::Classpath(name) => self.read_classpath(name).await?,
        };

        found.ok_or_else(|| PlatformError::not_found(location))
    }

    /// Read and parse a properties resource.
    ///
    /// Failures are logged here; callers decide whether they are fatal.
    ///
    /// # Errors
    ///
    /// Returns the read error, or [`PlatformError::InvalidInput`] if the
    /// content does not parse.
    pub async fn load_properties(&self, location: &str) -> Result<Properties, PlatformError> {
        let result = match self.read(location).await {
            Ok(bytes) => Properties::from_bytes(&bytes),
            Err(e) => Err(e),
        };

        match &result {
            Ok(props) => debug!(location, entries = props.len(), "Loaded properties"),
            Err(e) => error!(location, error = %e, "Failed to load properties"),
        }
        result
    }

    async fn read_classpath(&self, name: &str) -> Result<Option<Vec<u8>>, PlatformError> {
        let relative = name.trim_start_matches('/');
        if relative.is_empty() {
            return Ok(None);
        }

        for root in &self.roots {
            if let Some(bytes) = read_if_exists(&root.join(relative)).await? {
                return Ok(Some(bytes));
            }
        }
        Ok(None)
    }
}

async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, PlatformError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PlatformError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CONTENT: &str = "vault.gateway=https://vault:8200\nvault.decrypt.key=transit/decrypt/db\n";

    #[test]
    fn test_location_parse() {
        assert_eq!(
            ResourceLocation::parse("file:///tmp/a.properties"),
            ResourceLocation::File("/tmp/a.properties")
        );
        assert_eq!(
            ResourceLocation::parse("classpath:vault.properties"),
            ResourceLocation::Classpath("vault.properties")
        );
        assert_eq!(
            ResourceLocation::parse("conf/vault.properties"),
            ResourceLocation::Path("conf/vault.properties")
        );
    }

    #[test]
    fn test_from_classpath_defaults_to_cwd() {
        assert_eq!(ResourceLoader::from_classpath(None).roots(), [PathBuf::from(".")]);
        assert_eq!(
            ResourceLoader::from_classpath(Some(OsString::new())).roots(),
            [PathBuf::from(".")]
        );
    }

    #[test]
    fn test_from_classpath_splits_roots() {
        let value = std::env::join_paths(["/opt/a", "/opt/b"]).unwrap();
        let loader = ResourceLoader::from_classpath(Some(value));
        assert_eq!(loader.roots(), [PathBuf::from("/opt/a"), PathBuf::from("/opt/b")]);
    }

    #[tokio::test]
    async fn test_prefixes_resolve_to_same_mapping() {
        let classpath = tempfile::tempdir().unwrap();
        let files = tempfile::tempdir().unwrap();
        fs::write(classpath.path().join("vault.properties"), CONTENT).unwrap();
        let file_path = files.path().join("vault.properties");
        fs::write(&file_path, CONTENT).unwrap();

        let loader = ResourceLoader::new([classpath.path()]);
        let from_classpath = loader.load_properties("classpath:vault.properties").await.unwrap();
        let from_uri = loader
            .load_properties(&format!("file://{}", file_path.display()))
            .await
            .unwrap();
        let from_bare = loader.load_properties(&file_path.display().to_string()).await.unwrap();

        assert_eq!(from_classpath, from_uri);
        assert_eq!(from_uri, from_bare);
        assert_eq!(from_bare.get("vault.gateway"), Some("https://vault:8200"));
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_classpath() {
        let classpath = tempfile::tempdir().unwrap();
        fs::create_dir(classpath.path().join("conf")).unwrap();
        fs::write(classpath.path().join("conf/fallback-only.properties"), CONTENT).unwrap();

        let loader = ResourceLoader::new([classpath.path()]);
        let bare = loader.read("conf/fallback-only.properties").await.unwrap();
        let uri = loader.read("file://conf/fallback-only.properties").await.unwrap();
        assert_eq!(bare, CONTENT.as_bytes());
        assert_eq!(uri, CONTENT.as_bytes());
    }

    #[tokio::test]
    async fn test_classpath_prefix_ignores_filesystem() {
        let files = tempfile::tempdir().unwrap();
        let file_path = files.path().join("only-on-disk.properties");
        fs::write(&file_path, CONTENT).unwrap();

        let empty_root = tempfile::tempdir().unwrap();
        let loader = ResourceLoader::new([empty_root.path()]);
        let err = loader
            .read(&format!("classpath:{}", file_path.display()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_classpath_searches_roots_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("vault.properties"), "k=first").unwrap();
        fs::write(second.path().join("vault.properties"), "k=second").unwrap();

        let loader = ResourceLoader::new([first.path(), second.path()]);
        let props = loader.load_properties("classpath:/vault.properties").await.unwrap();
        assert_eq!(props.get("k"), Some("first"));
    }

    #[tokio::test]
    async fn test_missing_resource_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let loader = ResourceLoader::new([root.path()]);
        let err = loader.load_properties("classpath:absent.properties").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("classpath:absent.properties"));
    }

    #[tokio::test]
    async fn test_unparseable_content_is_invalid_input() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("bad.properties"), "k=\\uZZZZ").unwrap();

        let loader = ResourceLoader::new([root.path()]);
        let err = loader.load_properties("classpath:bad.properties").await.unwrap_err();
        assert!(matches!(err, PlatformError::InvalidInput(_)));
    }
}
