//! # geor
//!
//! Command-line administration of geOrchestra organizations.

#![forbid(unsafe_code)]

use clap::Parser;
use geor_cli::{
    cli::{Cli, Command},
    commands::{run_org, run_status},
    config::open_directory,
    output::error,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let directory = match open_directory(&cli).await {
        Ok(d) => d,
        Err(e) => {
            error(&format!("Failed to open directory: {e}"));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Org(cmd) => run_org(cmd, &directory, cli.output).await,
        Command::Status => run_status(&directory).await,
    };

    if let Err(e) = result {
        error(&e.to_string());
        std::process::exit(1);
    }
}
