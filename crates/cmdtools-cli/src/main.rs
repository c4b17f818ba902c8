//! cmdload - Main entry point

use clap::Parser;
use cmdtools_cli::{Cli, Commands};
use cmdtools_common::logging::{init_logging, LogConfig, LogLevel};
use std::process;
use tracing::debug;

#[tokio::main]
async fn main() {
    // Values from a local .env file behave like exported variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let base = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .log_file_prefix("cmdload")
        .build();

    // Environment variables take precedence over the flags
    let log_config = match base.clone().merge_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: ignoring logging environment: {}", e);
            base
        },
    };

    // The loader works without logging, so a failed init is not fatal
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    if let Err(e) = execute_command(&cli).await {
        // The message itself goes to stderr below
        debug!(error = ?e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> cmdtools_cli::Result<()> {
    let config = cli.loader_config()?;
    let credentials = cli.credentials.as_deref();

    match &cli.command {
        Commands::Upload {
            dataset_id,
            v4_path,
        } => cmdtools_cli::commands::upload::run(config, credentials, dataset_id, v4_path).await,

        Commands::Check { dataset_id } => {
            cmdtools_cli::commands::check::run(config, credentials, dataset_id).await
        },

        Commands::Status { job_id } => {
            cmdtools_cli::commands::status::run(config, credentials, job_id).await
        },

        Commands::Submit { job_id } => {
            cmdtools_cli::commands::submit::run(config, credentials, job_id).await
        },

        Commands::Instances { state } => {
            cmdtools_cli::commands::instances::run(config, credentials, state.as_deref()).await
        },
    }
}
