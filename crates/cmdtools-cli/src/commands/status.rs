//! `cmdload status` command implementation
//!
//! Shows a job, its files and the instance the import created.

use crate::config::LoaderConfig;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::pipeline::Pipeline;
use colored::Colorize;
use std::path::Path;

/// Show the state of a job
pub async fn run(config: LoaderConfig, credentials: Option<&Path>, job_id: &str) -> Result<()> {
    let credentials = Credentials::resolve(credentials)?;
    let pipeline = Pipeline::new(config)?;
    let token = pipeline.authenticate(&credentials).await?;

    let job = pipeline.jobs(&token).get_job(job_id).await?;

    println!("{} {}", "Job:".cyan().bold(), job.id.green());
    println!("  Recipe: {}", job.recipe);
    println!(
        "  State:  {}",
        job.state.map(|s| s.to_string()).unwrap_or_else(|| "unknown".to_string())
    );

    if job.files.is_empty() {
        println!("  Files:  {}", "none".yellow());
    } else {
        println!("  Files:");
        for file in &job.files {
            println!("    {} -> {}", file.alias_name, file.url);
        }
    }

    let Some(instance_id) = job.instance_id() else {
        println!("  Instance: not yet created");
        return Ok(());
    };

    let instance = pipeline.instances(&token).get_instance(instance_id).await?;
    println!();
    println!("{} {}", "Instance:".cyan().bold(), instance.id);
    println!("  State:        {}", instance.state.as_deref().unwrap_or("unknown"));
    if let Some(total) = instance.total_observations {
        println!(
            "  Observations: {} / {}",
            instance.total_inserted_observations.unwrap_or(0),
            total
        );
    }

    Ok(())
}
