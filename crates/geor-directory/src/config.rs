//! Directory client configuration.
//!
//! ## Transport Security
//!
//! Both `ldaps://` and `ldap://` URLs are accepted. A plain `ldap://` URL
//! should be paired with StartTLS; without it the bind credential crosses the
//! network in cleartext and a warning is logged when the pool is created.

use std::time::Duration;

use geor_core::PropertySources;
use serde::{Deserialize, Serialize};

use crate::dn::DirectoryLayout;
use crate::error::{DirectoryError, DirectoryResult};

// ============================================================================
// Property Keys
// ============================================================================

/// Property keys of the shared `default.properties`.
pub mod keys {
    /// `ldap` or `ldaps`.
    pub const SCHEME: &str = "ldapScheme";
    /// Directory host name.
    pub const HOST: &str = "ldapHost";
    /// Directory port.
    pub const PORT: &str = "ldapPort";
    /// Base path qualifying the search roots.
    pub const BASE_DN: &str = "ldapBaseDn";
    /// Users search root.
    pub const USERS_RDN: &str = "ldapUsersRdn";
    /// Organizations search root.
    pub const ORGS_RDN: &str = "ldapOrgsRdn";
    /// Service account DN.
    pub const ADMIN_DN: &str = "ldapAdminDn";
    /// Service account password.
    pub const ADMIN_PASSWORD: &str = "ldapAdminPassword";
    /// Enables StartTLS on `ldap://` connections.
    pub const STARTTLS: &str = "ldapStartTls";
}

const DEFAULT_SCHEME: &str = "ldap";
const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 389;
const DEFAULT_BASE_DN: &str = "dc=georchestra,dc=org";
const DEFAULT_USERS_RDN: &str = "ou=users";
const DEFAULT_ORGS_RDN: &str = "ou=orgs";
const DEFAULT_ADMIN_DN: &str = "cn=admin,dc=georchestra,dc=org";

// ============================================================================
// Directory Configuration
// ============================================================================

/// Directory client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    // === Connection ===
    /// Directory URL (`ldap://` or `ldaps://`).
    pub url: String,

    /// Bind DN of the service account.
    pub bind_dn: String,

    /// Bind credential (password).
    #[serde(skip_serializing)]
    pub bind_credential: String,

    /// Upgrades `ldap://` connections with StartTLS.
    pub starttls: bool,

    /// Skips server certificate verification. Test setups only.
    pub no_tls_verify: bool,

    // === Directory Structure ===
    /// Organizations search root, relative to `base_path`.
    pub orgs_rdn: String,

    /// Users search root, relative to `base_path`.
    pub users_rdn: String,

    /// Base path qualifying both search roots.
    pub base_path: String,

    // === Pool ===
    /// Maximum concurrent operations.
    pub pool_max_size: usize,

    /// Connection timeout.
    pub connection_timeout: Duration,

    /// Timeout applied to every directory operation.
    pub operation_timeout: Duration,
}

impl DirectoryConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> DirectoryConfigBuilder {
        DirectoryConfigBuilder::new()
    }

    /// Reads the configuration from the geOrchestra property keys.
    ///
    /// Every key but the admin password has a default matching the stock
    /// data directory.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::Configuration` if the password is missing or
    /// a value cannot be parsed.
    pub fn from_properties(props: &PropertySources) -> DirectoryResult<Self> {
        let scheme = props.get_or(keys::SCHEME, DEFAULT_SCHEME);
        let host = props.get_or(keys::HOST, DEFAULT_HOST);
        let port = props.get_parsed::<u16>(keys::PORT)?.unwrap_or(DEFAULT_PORT);
        let starttls = props.get_parsed::<bool>(keys::STARTTLS)?.unwrap_or(false);

        Self::builder()
            .url(format!("{scheme}://{host}:{port}"))
            .bind_dn(props.get_or(keys::ADMIN_DN, DEFAULT_ADMIN_DN))
            .bind_credential(props.require(keys::ADMIN_PASSWORD)?)
            .base_path(props.get_or(keys::BASE_DN, DEFAULT_BASE_DN))
            .users_rdn(props.get_or(keys::USERS_RDN, DEFAULT_USERS_RDN))
            .orgs_rdn(props.get_or(keys::ORGS_RDN, DEFAULT_ORGS_RDN))
            .starttls(starttls)
            .build()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DirectoryResult<()> {
        let url = self.url.to_lowercase();
        let rest = url
            .strip_prefix("ldaps://")
            .or_else(|| url.strip_prefix("ldap://"))
            .ok_or_else(|| {
                DirectoryError::config(format!("unsupported directory URL scheme: {}", self.url))
            })?;
        if rest.trim_end_matches('/').is_empty() {
            return Err(DirectoryError::config("directory URL is missing a host"));
        }
        if self.starttls && self.is_ldaps() {
            return Err(DirectoryError::config("StartTLS cannot be combined with ldaps://"));
        }

        if self.bind_dn.is_empty() {
            return Err(DirectoryError::config("bind_dn cannot be empty"));
        }
        if self.orgs_rdn.trim().is_empty() {
            return Err(DirectoryError::config("orgs_rdn cannot be empty"));
        }
        if self.users_rdn.trim().is_empty() {
            return Err(DirectoryError::config("users_rdn cannot be empty"));
        }
        if self.pool_max_size == 0 {
            return Err(DirectoryError::config("pool_max_size must be at least 1"));
        }

        Ok(())
    }

    /// Returns whether the URL uses LDAPS.
    #[must_use]
    pub fn is_ldaps(&self) -> bool {
        self.url.to_lowercase().starts_with("ldaps://")
    }

    /// Returns whether credentials would travel unencrypted.
    #[must_use]
    pub fn is_cleartext(&self) -> bool {
        !self.is_ldaps() && !self.starttls
    }

    /// Returns the directory layout described by this configuration.
    #[must_use]
    pub fn layout(&self) -> DirectoryLayout {
        DirectoryLayout::new(&self.orgs_rdn, &self.users_rdn, &self.base_path)
    }
}

// ============================================================================
// Configuration Builder
// ============================================================================

/// Builder for directory configuration.
#[derive(Debug)]
pub struct DirectoryConfigBuilder {
    url: Option<String>,
    bind_dn: Option<String>,
    bind_credential: Option<String>,
    starttls: bool,
    no_tls_verify: bool,
    orgs_rdn: String,
    users_rdn: String,
    base_path: String,
    pool_max_size: usize,
    connection_timeout: Duration,
    operation_timeout: Duration,
}

impl Default for DirectoryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryConfigBuilder {
    /// Creates a new builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            url: None,
            bind_dn: None,
            bind_credential: None,
            starttls: false,
            no_tls_verify: false,
            orgs_rdn: DEFAULT_ORGS_RDN.to_string(),
            users_rdn: DEFAULT_USERS_RDN.to_string(),
            base_path: DEFAULT_BASE_DN.to_string(),
            pool_max_size: 10,
            connection_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the directory URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the bind DN.
    #[must_use]
    pub fn bind_dn(mut self, dn: impl Into<String>) -> Self {
        self.bind_dn = Some(dn.into());
        self
    }

    /// Sets the bind credential (password).
    #[must_use]
    pub fn bind_credential(mut self, credential: impl Into<String>) -> Self {
        self.bind_credential = Some(credential.into());
        self
    }

    /// Enables StartTLS.
    #[must_use]
    pub const fn starttls(mut self, enabled: bool) -> Self {
        self.starttls = enabled;
        self
    }

    /// Disables certificate verification.
    #[must_use]
    pub const fn no_tls_verify(mut self, skip: bool) -> Self {
        self.no_tls_verify = skip;
        self
    }

    /// Sets the organizations search root.
    #[must_use]
    pub fn orgs_rdn(mut self, rdn: impl Into<String>) -> Self {
        self.orgs_rdn = rdn.into();
        self
    }

    /// Sets the users search root.
    #[must_use]
    pub fn users_rdn(mut self, rdn: impl Into<String>) -> Self {
        self.users_rdn = rdn.into();
        self
    }

    /// Sets the base path.
    #[must_use]
    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = path.into();
        self
    }

    /// Sets the maximum number of concurrent operations.
    #[must_use]
    pub const fn pool_max_size(mut self, max: usize) -> Self {
        self.pool_max_size = max;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the per-operation timeout.
    #[must_use]
    pub const fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - Required fields are missing
    /// - The URL scheme is not `ldap://` or `ldaps://`
    pub fn build(self) -> DirectoryResult<DirectoryConfig> {
        let config = DirectoryConfig {
            url: self
                .url
                .ok_or_else(|| DirectoryError::config("url is required"))?,
            bind_dn: self
                .bind_dn
                .ok_or_else(|| DirectoryError::config("bind_dn is required"))?,
            bind_credential: self
                .bind_credential
                .ok_or_else(|| DirectoryError::config("bind_credential is required"))?,
            starttls: self.starttls,
            no_tls_verify: self.no_tls_verify,
            orgs_rdn: self.orgs_rdn,
            users_rdn: self.users_rdn,
            base_path: self.base_path,
            pool_max_size: self.pool_max_size,
            connection_timeout: self.connection_timeout,
            operation_timeout: self.operation_timeout,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use geor_core::PropertySource;

    use super::*;

    fn builder() -> DirectoryConfigBuilder {
        DirectoryConfig::builder()
            .url("ldap://localhost:389")
            .bind_dn("cn=admin,dc=georchestra,dc=org")
            .bind_credential("secret")
    }

    fn props(pairs: &[(&str, &str)]) -> PropertySources {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let mut sources = PropertySources::new();
        sources.add_last(PropertySource::from_map("test", map));
        sources
    }

    #[test]
    fn accepts_both_schemes() {
        assert!(builder().build().is_ok());
        assert!(builder().url("ldaps://ldap.example.com:636").build().is_ok());
        let config = builder().starttls(true).build().unwrap();
        assert!(!config.is_cleartext());
    }

    #[test]
    fn rejects_unknown_scheme_and_missing_host() {
        let err = builder().url("http://ldap.example.com").build().unwrap_err();
        assert!(matches!(err, DirectoryError::Configuration(_)));
        assert!(builder().url("ldap://").build().is_err());
    }

    #[test]
    fn rejects_starttls_over_ldaps() {
        assert!(builder()
            .url("ldaps://ldap.example.com")
            .starttls(true)
            .build()
            .is_err());
    }

    #[test]
    fn requires_credentials() {
        let result = DirectoryConfig::builder()
            .url("ldap://localhost")
            .bind_dn("cn=admin")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn layout_uses_configured_roots() {
        let config = builder()
            .orgs_rdn("ou=orgs")
            .users_rdn("ou=people")
            .base_path("dc=example,dc=com")
            .build()
            .unwrap();
        let layout = config.layout();
        assert_eq!(layout.org_dn("acme"), "cn=acme,ou=orgs,dc=example,dc=com");
        assert_eq!(layout.user_dn("jdoe"), "uid=jdoe,ou=people,dc=example,dc=com");
    }

    #[test]
    fn reads_georchestra_properties() {
        let sources = props(&[
            ("ldapScheme", "ldaps"),
            ("ldapHost", "ldap.georchestra.org"),
            ("ldapPort", "636"),
            ("ldapBaseDn", "dc=example,dc=org"),
            ("ldapOrgsRdn", "ou=companies"),
            ("ldapAdminPassword", "secret"),
        ]);
        let config = DirectoryConfig::from_properties(&sources).unwrap();

        assert_eq!(config.url, "ldaps://ldap.georchestra.org:636");
        assert_eq!(config.bind_dn, DEFAULT_ADMIN_DN);
        assert_eq!(config.orgs_rdn, "ou=companies");
        assert_eq!(config.users_rdn, "ou=users");
        assert_eq!(config.layout().orgs_base(), "ou=companies,dc=example,dc=org");
    }

    #[test]
    fn property_defaults_match_stock_datadir() {
        let config = DirectoryConfig::from_properties(&props(&[("ldapAdminPassword", "x")])).unwrap();
        assert_eq!(config.url, "ldap://localhost:389");
        assert_eq!(config.base_path, "dc=georchestra,dc=org");
        assert!(config.is_cleartext());
    }

    #[test]
    fn property_errors_are_configuration_errors() {
        let missing = DirectoryConfig::from_properties(&props(&[])).unwrap_err();
        assert!(matches!(missing, DirectoryError::Configuration(_)));

        let bad_port = props(&[("ldapPort", "many"), ("ldapAdminPassword", "x")]);
        assert!(DirectoryConfig::from_properties(&bad_port).is_err());
    }

    #[test]
    fn credential_is_not_serialized() {
        let json = serde_json::to_string(&builder().build().unwrap()).unwrap();
        assert!(!json.contains("secret"));
    }
}
