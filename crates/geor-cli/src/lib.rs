//! # geor-cli
//!
//! Command-line administration of geOrchestra organizations.
//!
//! The `geor` binary drives the organization directory gateway:
//! - Listing and looking up organizations and their extensions
//! - Creating organizations and extensions
//! - Adding and removing members
//! - Checking directory connectivity

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use config::OutputFormat;
pub use error::{CliError, CliResult};
