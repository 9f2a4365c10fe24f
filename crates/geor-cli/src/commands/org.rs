//! Organization management commands.

use geor_directory::{Organization, OrganizationExtension, OrgsDirectory};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::cli::OrgCommand;
use crate::config::OutputFormat;
use crate::output::{info, output, output_single, success, Identified};
use crate::CliResult;

/// Organization representation for display.
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
pub struct OrgDisplay {
    /// Organization ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short name.
    pub short_name: String,
    /// Cities, comma separated.
    pub cities: String,
    /// Status.
    pub status: String,
    /// Number of members.
    pub members: usize,
}

impl From<&Organization> for OrgDisplay {
    fn from(org: &Organization) -> Self {
        Self {
            id: org.id.clone(),
            name: org.name.clone().unwrap_or_default(),
            short_name: org.short_name.clone().unwrap_or_default(),
            cities: org.cities.join(", "),
            status: org.status.clone().unwrap_or_default(),
            members: org.members.len(),
        }
    }
}

impl Identified for OrgDisplay {
    fn identifier(&self) -> &str {
        &self.id
    }
}

/// Organization extension representation for display.
#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
pub struct OrgExtDisplay {
    /// Organization ID.
    pub id: String,
    /// Organization type.
    pub org_type: String,
    /// Postal address.
    pub address: String,
}

impl From<&OrganizationExtension> for OrgExtDisplay {
    fn from(ext: &OrganizationExtension) -> Self {
        Self {
            id: ext.id.clone(),
            org_type: ext.org_type.clone().unwrap_or_default(),
            address: ext.address.clone().unwrap_or_default(),
        }
    }
}

impl Identified for OrgExtDisplay {
    fn identifier(&self) -> &str {
        &self.id
    }
}

/// Runs an organization command.
pub async fn run_org(
    cmd: OrgCommand,
    directory: &OrgsDirectory,
    output_format: OutputFormat,
) -> CliResult<()> {
    match cmd {
        OrgCommand::List => list_orgs(directory, output_format).await,
        OrgCommand::Get { id } => get_org(directory, &id, output_format).await,
        OrgCommand::GetExt { id } => get_org_ext(directory, &id, output_format).await,
        OrgCommand::ForUser { user } => org_for_user(directory, &user, output_format).await,
        OrgCommand::Create {
            id,
            name,
            short_name,
            cities,
            status,
            members,
        } => {
            let org = Organization {
                id,
                name,
                short_name,
                cities,
                status,
                members,
            };
            create_org(directory, &org).await
        }
        OrgCommand::CreateExt {
            id,
            org_type,
            address,
        } => {
            let ext = OrganizationExtension {
                id,
                org_type,
                address,
            };
            create_org_ext(directory, &ext).await
        }
        OrgCommand::AddUser { org, user } => add_user(directory, &org, &user).await,
        OrgCommand::RemoveUser { org, user } => remove_user(directory, &org, &user).await,
    }
}

/// Lists all organizations.
async fn list_orgs(directory: &OrgsDirectory, output_format: OutputFormat) -> CliResult<()> {
    let orgs = directory.find_all().await?;
    let display: Vec<OrgDisplay> = orgs.iter().map(OrgDisplay::from).collect();
    output(&display, output_format)
}

/// Gets organization details.
async fn get_org(directory: &OrgsDirectory, id: &str, output_format: OutputFormat) -> CliResult<()> {
    let org = directory
        .find_by_common_name(id)
        .await
        .map_err(|e| crate::CliError::from(e).for_resource("organization", id))?;

    match output_format {
        // Members are only listed in full by the JSON form.
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&org)?),
        _ => output_single(&OrgDisplay::from(&org), output_format)?,
    }
    Ok(())
}

/// Gets organization extension details.
async fn get_org_ext(
    directory: &OrgsDirectory,
    id: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let ext = directory
        .find_ext_by_id(id)
        .await
        .map_err(|e| crate::CliError::from(e).for_resource("organization extension", id))?;
    output_single(&OrgExtDisplay::from(&ext), output_format)
}

/// Finds the organization of a user.
async fn org_for_user(
    directory: &OrgsDirectory,
    user: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    match directory.find_for_user(user).await? {
        Some(org) => output_single(&OrgDisplay::from(&org), output_format),
        None => {
            if output_format == OutputFormat::Json {
                println!("null");
            } else if output_format == OutputFormat::Table {
                info(&format!("User '{user}' does not belong to any organization"));
            }
            Ok(())
        }
    }
}

/// Creates an organization.
async fn create_org(directory: &OrgsDirectory, org: &Organization) -> CliResult<()> {
    directory.insert(org).await?;
    success(&format!("Organization '{}' created", org.id));
    Ok(())
}

/// Creates an organization extension.
async fn create_org_ext(directory: &OrgsDirectory, ext: &OrganizationExtension) -> CliResult<()> {
    directory.insert_ext(ext).await?;
    success(&format!("Extension for organization '{}' created", ext.id));
    Ok(())
}

/// Adds a user to an organization.
async fn add_user(directory: &OrgsDirectory, org: &str, user: &str) -> CliResult<()> {
    directory
        .add_user(org, user)
        .await
        .map_err(|e| crate::CliError::from(e).for_resource("organization", org))?;
    success(&format!("User '{user}' added to organization '{org}'"));
    Ok(())
}

/// Removes a user from an organization.
async fn remove_user(directory: &OrgsDirectory, org: &str, user: &str) -> CliResult<()> {
    directory
        .remove_user(org, user)
        .await
        .map_err(|e| crate::CliError::from(e).for_resource("organization", org))?;
    success(&format!("User '{user}' removed from organization '{org}'"));
    Ok(())
}
