use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use gpc_mcp_core::config::GpcConfig;
use tracing_subscriber::EnvFilter;

mod args;
mod runner;

use args::{Args, Command};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Logs go to stderr so the stdio transport owns stdout
    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = GpcConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Serve(serve) => {
            runner::serve(config, serve).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Call(call) => {
            if runner::call(config, call).await? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
