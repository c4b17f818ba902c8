//! `cmdload upload` command implementation
//!
//! Runs the full load for one v4 file.

use crate::config::LoaderConfig;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::progress::format_bytes;
use colored::Colorize;
use std::path::Path;

/// Upload `v4_path` into `dataset_id` and submit the resulting job
pub async fn run(
    config: LoaderConfig,
    credentials: Option<&Path>,
    dataset_id: &str,
    v4_path: &Path,
) -> Result<()> {
    let credentials = Credentials::resolve(credentials)?;
    let size = tokio::fs::metadata(v4_path).await?.len();

    println!(
        "{} Loading {} ({}) into {}...",
        "→".cyan(),
        v4_path.display(),
        format_bytes(size),
        dataset_id.bold()
    );

    let pipeline = Pipeline::new(config)?;
    let summary = pipeline.run(&credentials, dataset_id, v4_path).await?;

    if let Some(ref warning) = summary.warning {
        println!("{} {}", "!".yellow(), warning.to_string().yellow());
    }

    println!("{} Uploaded to {}", "✓".green(), summary.storage_locator);
    println!("{} Submitted job {}", "✓".green(), summary.job_id.bold());
    println!("  Recipe:   {}", summary.recipe_id);
    if let Some(ref instance_id) = summary.instance_id {
        println!("  Instance: {}", instance_id);
    }

    Ok(())
}
