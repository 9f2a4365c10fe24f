//! CLI configuration.
//!
//! The directory connection is read from the geOrchestra properties, the data
//! directory's `default.properties` first and then the environment. Flags
//! given on the command line take precedence over both.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use geor_core::{DefaultPropsInitializer, PropertySource, PropertySources};
use geor_directory::config::keys;
use geor_directory::{
    DirectoryConfig, DirectoryLayout, InMemoryDirectory, Organization, OrgsDirectory,
};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::error::{CliError, CliResult};

/// Name of the property source holding command-line overrides.
const COMMAND_LINE_SOURCE: &str = "commandLine";

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format.
    #[default]
    Table,
    /// JSON format.
    Json,
    /// Identifiers only.
    Quiet,
}

/// Loads the property sources for a CLI invocation.
///
/// An explicit `properties` file replaces the data directory lookup.
#[must_use]
pub fn load_properties(properties: Option<&Path>) -> PropertySources {
    let _ = dotenvy::dotenv();

    let mut sources = PropertySources::new();
    sources.add_last(PropertySource::environment());

    let initializer = properties.map_or_else(DefaultPropsInitializer::from_env, |path| {
        DefaultPropsInitializer::with_path(path)
    });
    initializer.initialize(&mut sources);
    sources
}

/// Puts the credential flags in front of the loaded properties.
fn with_overrides(cli: &Cli, props: &PropertySources) -> PropertySources {
    let mut values = HashMap::new();
    if let Some(dn) = &cli.bind_dn {
        values.insert(keys::ADMIN_DN.to_string(), dn.clone());
    }
    if let Some(password) = &cli.bind_password {
        values.insert(keys::ADMIN_PASSWORD.to_string(), password.clone());
    }

    let mut layered = props.clone();
    if !values.is_empty() {
        layered.add_first(PropertySource::from_map(COMMAND_LINE_SOURCE, values));
    }
    layered
}

/// Resolves the directory configuration from properties and flags.
///
/// ## Errors
///
/// Returns `CliError::Directory` if the admin password is missing or the
/// resulting configuration is invalid.
pub fn directory_config(cli: &Cli, props: &PropertySources) -> CliResult<DirectoryConfig> {
    let mut config = DirectoryConfig::from_properties(&with_overrides(cli, props))?;
    if let Some(url) = &cli.ldap_url {
        config.url.clone_from(url);
    }
    config.starttls |= cli.starttls;
    config.validate()?;
    Ok(config)
}

/// Reads the directory layout alone, without requiring credentials.
#[must_use]
pub fn directory_layout(props: &PropertySources) -> DirectoryLayout {
    let defaults = DirectoryLayout::default();
    DirectoryLayout::new(
        props.get_or(keys::ORGS_RDN, &defaults.orgs_rdn),
        props.get_or(keys::USERS_RDN, &defaults.users_rdn),
        props.get_or(keys::BASE_DN, &defaults.base_path),
    )
}

/// Opens the organization gateway the CLI operates on.
///
/// With `--memory` the gateway runs against an empty in-memory directory,
/// optionally preloaded from the `--seed` file.
pub async fn open_directory(cli: &Cli) -> CliResult<OrgsDirectory> {
    let props = load_properties(cli.properties.as_deref());

    if !cli.memory {
        let config = directory_config(cli, &props)?;
        tracing::debug!(url = %config.url, bind_dn = %config.bind_dn, "using LDAP directory");
        return Ok(OrgsDirectory::connect(config));
    }

    let layout = directory_layout(&props);
    tracing::debug!(orgs = %layout.orgs_base(), "using in-memory directory");
    let directory = OrgsDirectory::new(Arc::new(InMemoryDirectory::with_layout(&layout)), layout);

    if let Some(seed) = &cli.seed {
        let orgs = read_seed(seed)?;
        for org in &orgs {
            directory.insert(org).await?;
        }
        tracing::debug!(count = orgs.len(), file = %seed.display(), "seeded in-memory directory");
    }
    Ok(directory)
}

/// Reads a JSON array of organizations.
fn read_seed(path: &Path) -> CliResult<Vec<Organization>> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        CliError::InvalidArgument(format!("seed file {} is not valid: {e}", path.display()))
    })
}
