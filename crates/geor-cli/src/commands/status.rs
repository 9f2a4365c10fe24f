//! Status command.

use geor_directory::OrgsDirectory;

use crate::output::{error, info, success};

/// Checks that the directory answers with the configured credentials.
pub async fn run_status(directory: &OrgsDirectory) -> crate::CliResult<()> {
    let orgs_base = directory.layout().orgs_base();
    info(&format!("Checking directory at {orgs_base}"));

    match directory.test_connection().await {
        Ok(()) => {
            success("Directory is reachable");
            Ok(())
        }
        Err(e) => {
            error("Directory is not reachable");
            Err(e.into())
        }
    }
}
