//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::OutputFormat;

/// geOrchestra administration tool.
#[derive(Debug, Parser)]
#[command(name = "geor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Properties file layered over the environment
    /// (defaults to `$GEORCHESTRA_DATADIR/default.properties`).
    #[arg(long, env = "GEOR_PROPERTIES")]
    pub properties: Option<PathBuf>,

    /// Directory URL, e.g. `ldap://localhost:389` (overrides properties).
    #[arg(long, env = "GEOR_LDAP_URL")]
    pub ldap_url: Option<String>,

    /// Service account DN (overrides properties).
    #[arg(long, env = "GEOR_LDAP_BIND_DN")]
    pub bind_dn: Option<String>,

    /// Service account password (overrides properties).
    #[arg(long, env = "GEOR_LDAP_BIND_PASSWORD", hide_env_values = true)]
    pub bind_password: Option<String>,

    /// Upgrade `ldap://` connections with StartTLS.
    #[arg(long)]
    pub starttls: bool,

    /// Use a throwaway in-memory directory instead of a server.
    #[arg(long)]
    pub memory: bool,

    /// JSON file of organizations to preload into the in-memory directory.
    #[arg(long, requires = "memory")]
    pub seed: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Organization management commands.
    #[command(subcommand)]
    Org(OrgCommand),

    /// Directory connectivity check.
    Status,
}

/// Organization commands.
#[derive(Debug, Subcommand)]
pub enum OrgCommand {
    /// List all organizations.
    List,

    /// Get organization details.
    Get {
        /// Organization identifier.
        id: String,
    },

    /// Get organization extension details.
    GetExt {
        /// Organization identifier.
        id: String,
    },

    /// Find the organization a user belongs to.
    ForUser {
        /// User identifier.
        user: String,
    },

    /// Create an organization.
    Create {
        /// Organization identifier.
        id: String,

        /// Display name.
        #[arg(long)]
        name: Option<String>,

        /// Short name.
        #[arg(long)]
        short_name: Option<String>,

        /// City (repeatable, order is kept).
        #[arg(long = "city")]
        cities: Vec<String>,

        /// Status.
        #[arg(long)]
        status: Option<String>,

        /// Initial member (repeatable).
        #[arg(long = "member")]
        members: Vec<String>,
    },

    /// Create an organization extension.
    CreateExt {
        /// Organization identifier.
        id: String,

        /// Organization type.
        #[arg(long)]
        org_type: Option<String>,

        /// Postal address.
        #[arg(long)]
        address: Option<String>,
    },

    /// Add a user to an organization.
    AddUser {
        /// Organization identifier.
        org: String,
        /// User identifier.
        user: String,
    },

    /// Remove a user from an organization.
    RemoveUser {
        /// Organization identifier.
        org: String,
        /// User identifier.
        user: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_repeatable_cities_in_order() {
        let cli = Cli::try_parse_from([
            "geor", "--memory", "org", "create", "psc", "--city", "Paris", "--city", "Lyon",
        ])
        .unwrap();

        match cli.command {
            Command::Org(OrgCommand::Create { id, cities, members, .. }) => {
                assert_eq!(id, "psc");
                assert_eq!(cities, vec!["Paris", "Lyon"]);
                assert!(members.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn seed_requires_memory() {
        assert!(Cli::try_parse_from(["geor", "--seed", "orgs.json", "org", "list"]).is_err());
    }

    #[test]
    fn parses_json_output() {
        let cli = Cli::try_parse_from(["geor", "-o", "json", "org", "for-user", "jdoe"]).unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(cli.command, Command::Org(OrgCommand::ForUser { .. })));
    }
}
