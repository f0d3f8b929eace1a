mod cli;
mod config;
mod files;
mod mcp;
mod page_spec;
mod pdf;
mod trim;
mod workflow;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Log to stderr; stdout carries user output and the MCP protocol.
fn init_tracing(debug: bool) {
    let default_level = if debug { "pdftrim=debug" } else { "pdftrim=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.config();
    init_tracing(config.debug);

    let Some(request) = cli.command.into_request() else {
        mcp::run_server(config).await?;
        return Ok(ExitCode::SUCCESS);
    };

    let summary = workflow::run(&request, &config)?;
    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
