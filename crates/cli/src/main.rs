//! pwa-cache host entry point.
//!
//! Drives the caching policy engine from the command line: run the
//! install/activate lifecycle, serve requests through it, inspect stores.
//! Logging goes to stderr so command output on stdout stays parseable JSON.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod host;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = commands::Cli::parse();
    let output = commands::run(cli).await?;
    println!("{output}");

    Ok(())
}
