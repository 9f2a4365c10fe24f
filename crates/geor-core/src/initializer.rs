//! Default properties bootstrap.
//!
//! Every geOrchestra service reads the shared `default.properties` from the
//! data directory before its own configuration. The file is installed as the
//! highest-precedence property source; failing to read it is logged and
//! startup carries on with whatever the other sources provide.

use std::path::{Path, PathBuf};

use crate::properties::{PropertySource, PropertySources};

/// Data directory used when `GEORCHESTRA_DATADIR` is not set.
pub const DEFAULT_DATADIR: &str = "/etc/georchestra";

/// File name of the shared defaults inside the data directory.
pub const DEFAULT_PROPERTIES_FILE: &str = "default.properties";

/// Environment variable overriding the data directory.
pub const DATADIR_ENV: &str = "GEORCHESTRA_DATADIR";

/// Installs the shared `default.properties` ahead of the other sources.
#[derive(Debug, Clone)]
pub struct DefaultPropsInitializer {
    path: PathBuf,
}

impl Default for DefaultPropsInitializer {
    fn default() -> Self {
        Self::with_path(Path::new(DEFAULT_DATADIR).join(DEFAULT_PROPERTIES_FILE))
    }
}

impl DefaultPropsInitializer {
    /// Creates an initializer for `/etc/georchestra/default.properties`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an initializer for an explicit file.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates an initializer honouring `GEORCHESTRA_DATADIR`.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(DATADIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => {
                Self::with_path(Path::new(dir.trim()).join(DEFAULT_PROPERTIES_FILE))
            }
            _ => Self::default(),
        }
    }

    /// Returns the file this initializer loads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file and installs it as the first property source.
    ///
    /// Returns `true` when the file was loaded. A missing or malformed file
    /// leaves `sources` untouched.
    pub fn initialize(&self, sources: &mut PropertySources) -> bool {
        match PropertySource::from_file(&self.path) {
            Ok(source) => {
                tracing::info!(
                    path = %self.path.display(),
                    "Loaded default properties"
                );
                sources.add_first(source);
                true
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Default properties not loaded"
                );
                false
            }
        }
    }
}

/// Builds the standard property sources for a service.
///
/// Loads `.env` if present, registers the process environment, then puts the
/// shared defaults file in front of it.
#[must_use]
pub fn bootstrap() -> PropertySources {
    let _ = dotenvy::dotenv();

    let mut sources = PropertySources::new();
    sources.add_last(PropertySource::environment());
    DefaultPropsInitializer::from_env().initialize(&mut sources);
    sources
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn default_path_points_at_datadir() {
        let init = DefaultPropsInitializer::new();
        assert_eq!(
            init.path(),
            Path::new("/etc/georchestra/default.properties")
        );
    }

    #[test]
    fn installs_defaults_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_PROPERTIES_FILE);
        std::fs::write(&path, "ldapHost=ldap.georchestra.local\nldapPort=389\n").unwrap();

        let mut sources = PropertySources::new();
        let mut env_like = HashMap::new();
        env_like.insert("ldapHost".to_string(), "from-env".to_string());
        env_like.insert("ldapScheme".to_string(), "ldaps".to_string());
        sources.add_last(PropertySource::from_map("env", env_like));

        let loaded = DefaultPropsInitializer::with_path(&path).initialize(&mut sources);

        assert!(loaded);
        assert_eq!(sources.names().len(), 2);
        assert_eq!(sources.get("ldapHost").as_deref(), Some("ldap.georchestra.local"));
        assert_eq!(sources.get("ldapScheme").as_deref(), Some("ldaps"));
    }

    #[test]
    fn missing_file_keeps_existing_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = PropertySources::new();
        sources.add_last(PropertySource::from_map("env", HashMap::new()));

        let loaded = DefaultPropsInitializer::with_path(dir.path().join("absent.properties"))
            .initialize(&mut sources);

        assert!(!loaded);
        assert_eq!(sources.names(), vec!["env"]);
    }
}
