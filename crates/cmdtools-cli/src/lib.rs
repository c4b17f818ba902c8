//! CMD dataset loader
//!
//! Loads a v4 file into the CMD publishing platform as a new import job.
//!
//! # Overview
//!
//! A full load (`cmdload upload`) runs these stages, stopping at the first
//! failure:
//!
//! - **Authenticate**: exchange credentials for an access token
//! - **Check**: make sure a recipe produces the target dataset
//! - **Upload**: send the file in resumable chunks
//! - **Create job**: register an import job for the uploaded file
//! - **Submit**: move the job from `created` to `submitted`
//!
//! `check`, `status`, `submit` and `instances` expose single stages and
//! lookups for troubleshooting.

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod api;
pub mod auth;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod instances;
pub mod jobs;
pub mod pipeline;
pub mod progress;
pub mod recipes;
pub mod upload;

// Re-export commonly used types
pub use config::LoaderConfig;
pub use credentials::{AccessToken, Credentials};
pub use error::{CliError, Result};
pub use pipeline::{Pipeline, RunSummary};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cmdload - load v4 files into CMD
#[derive(Parser, Debug)]
#[command(name = "cmdload")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Hide the upload progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// API root URL
    #[arg(long, env = "CMD_API_ROOT", global = true)]
    pub api_root: Option<String>,

    /// Upload bucket URL
    #[arg(long, env = "CMD_DATASET_UPLOAD_BUCKET", global = true)]
    pub bucket_url: Option<String>,

    /// JSON file holding {"email", "password"} (instead of FLORENCE_USERNAME/FLORENCE_PASSWORD)
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,

    /// Skip TLS certificate verification (non-production endpoints only)
    #[arg(long, global = true)]
    pub insecure: bool,
}

impl Cli {
    /// Environment configuration with command-line overrides applied
    pub fn loader_config(&self) -> Result<LoaderConfig> {
        let mut config = LoaderConfig::from_env()?;

        if let Some(ref root) = self.api_root {
            config.set_api_root(root.clone());
        }

        if let Some(ref bucket) = self.bucket_url {
            config.set_bucket_url(bucket.clone());
        }

        if self.insecure {
            config.accept_invalid_certs = true;
        }

        config.show_progress = !self.quiet;
        config.validate()?;
        Ok(config)
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a v4 file, create an import job for it and submit the job
    Upload {
        /// Dataset the file is loaded into (e.g. "cpih01")
        dataset_id: String,

        /// Path to the v4 file
        v4_path: PathBuf,
    },

    /// Check that a recipe exists for a dataset
    Check {
        /// Dataset id to look up
        dataset_id: String,
    },

    /// Show a job and the instance it created
    Status {
        /// Job id
        job_id: String,
    },

    /// Submit an existing job
    Submit {
        /// Job id
        job_id: String,
    },

    /// List dataset instances
    Instances {
        /// Only show instances in this state (e.g. "completed")
        #[arg(short, long)]
        state: Option<String>,
    },
}
