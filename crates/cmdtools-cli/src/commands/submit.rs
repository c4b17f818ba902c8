//! `cmdload submit` command implementation
//!
//! Submits a job created earlier, e.g. after a run stopped between job
//! creation and submission.

use crate::config::LoaderConfig;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::pipeline::Pipeline;
use colored::Colorize;
use std::path::Path;

pub async fn run(config: LoaderConfig, credentials: Option<&Path>, job_id: &str) -> Result<()> {
    let credentials = Credentials::resolve(credentials)?;
    let pipeline = Pipeline::new(config)?;
    let token = pipeline.authenticate(&credentials).await?;

    pipeline.jobs(&token).submit(job_id).await?;

    println!("{} Submitted job {}", "✓".green(), job_id.bold());
    Ok(())
}
