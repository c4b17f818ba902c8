//! `cmdload instances` command implementation
//!
//! Lists dataset instances, optionally only those in one state.

use crate::config::LoaderConfig;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::pipeline::Pipeline;
use colored::Colorize;
use std::path::Path;

pub async fn run(
    config: LoaderConfig,
    credentials: Option<&Path>,
    state: Option<&str>,
) -> Result<()> {
    let credentials = Credentials::resolve(credentials)?;
    let pipeline = Pipeline::new(config)?;
    let token = pipeline.authenticate(&credentials).await?;

    let instances: Vec<_> = pipeline
        .instances(&token)
        .list_instances()
        .await?
        .into_iter()
        .filter(|i| state.is_none() || i.state.as_deref() == state)
        .collect();

    if instances.is_empty() {
        println!("No instances found.");
        return Ok(());
    }

    println!("{}", "Instances:".cyan().bold());
    for instance in &instances {
        println!(
            "  {}  {}",
            instance.id.green(),
            instance.state.as_deref().unwrap_or("unknown")
        );
    }
    println!();
    println!("  Total: {}", instances.len());

    Ok(())
}
