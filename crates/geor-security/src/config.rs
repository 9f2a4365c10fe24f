//! CAS client configuration.

use geor_core::PropertySources;
use serde::{Deserialize, Serialize};

use crate::error::{CasError, CasResult};

/// Path on which the proxy receives CAS service tickets by default.
pub const DEFAULT_PROCESSING_PATH: &str = "/login/cas";

/// CAS client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasConfig {
    /// CAS server prefix, e.g. `https://georchestra.example.org/cas`.
    pub server_url: String,

    /// Service URL tickets are issued for.
    pub service_url: String,

    /// Path of the ticket processing endpoint.
    pub processing_path: String,
}

impl CasConfig {
    /// Creates a configuration with the default processing path.
    #[must_use]
    pub fn new(server_url: impl Into<String>, service_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            service_url: service_url.into(),
            processing_path: DEFAULT_PROCESSING_PATH.to_string(),
        }
    }

    /// Sets the processing path.
    #[must_use]
    pub fn with_processing_path(mut self, path: impl Into<String>) -> Self {
        self.processing_path = path.into();
        self
    }

    /// Derives the configuration from the `scheme` and `domainName`
    /// properties shared by all geOrchestra applications.
    ///
    /// ## Errors
    ///
    /// Returns `CasError::Configuration` if `domainName` is not defined.
    pub fn from_properties(props: &PropertySources) -> CasResult<Self> {
        let scheme = props.get_or("scheme", "https");
        let domain = props.require("domainName")?;
        let config = Self::new(
            format!("{scheme}://{domain}/cas"),
            format!("{scheme}://{domain}{DEFAULT_PROCESSING_PATH}"),
        );
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CasResult<()> {
        for (name, url) in [("server_url", &self.server_url), ("service_url", &self.service_url)] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(CasError::config(format!("{name} must be an http(s) URL")));
            }
        }
        if !self.processing_path.starts_with('/') {
            return Err(CasError::config("processing_path must start with '/'"));
        }
        Ok(())
    }

    /// Returns the ticket validation endpoint.
    #[must_use]
    pub fn service_validate_url(&self) -> String {
        format!("{}/serviceValidate", self.server_url)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use geor_core::PropertySource;

    use super::*;

    #[test]
    fn builds_urls_from_shared_properties() {
        let mut map = HashMap::new();
        map.insert("domainName".to_string(), "georchestra.example.org".to_string());
        let mut props = PropertySources::new();
        props.add_first(PropertySource::from_map("default", map));

        let config = CasConfig::from_properties(&props).unwrap();
        assert_eq!(config.server_url, "https://georchestra.example.org/cas");
        assert_eq!(config.service_url, "https://georchestra.example.org/login/cas");
        assert_eq!(
            config.service_validate_url(),
            "https://georchestra.example.org/cas/serviceValidate"
        );
    }

    #[test]
    fn missing_domain_is_a_configuration_error() {
        let err = CasConfig::from_properties(&PropertySources::new()).unwrap_err();
        assert!(matches!(err, CasError::Configuration(_)));
    }

    #[test]
    fn validates_urls_and_path() {
        assert!(CasConfig::new("https://cas/", "https://app/login/cas").validate().is_ok());
        assert!(CasConfig::new("cas", "https://app").validate().is_err());
        assert!(CasConfig::new("https://cas", "https://app")
            .with_processing_path("login")
            .validate()
            .is_err());
    }
}
