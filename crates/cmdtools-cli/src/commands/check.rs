//! `cmdload check` command implementation

use crate::config::LoaderConfig;
use crate::credentials::Credentials;
use crate::error::Result;
use crate::pipeline::Pipeline;
use colored::Colorize;
use std::path::Path;

/// Report the recipe a dataset resolves to
pub async fn run(config: LoaderConfig, credentials: Option<&Path>, dataset_id: &str) -> Result<()> {
    let credentials = Credentials::resolve(credentials)?;
    let pipeline = Pipeline::new(config)?;
    let token = pipeline.authenticate(&credentials).await?;

    let resolver = pipeline.recipes(&token);
    let recipe = resolver.resolve(dataset_id).await?;
    let catalog_size = resolver.catalog().await?.items().len();

    // The catalog entry is a summary; the recipe endpoint has the full document
    let details = resolver.fetch_by_id(&recipe.recipe_id).await?;
    let editions = details
        .output_instances
        .first()
        .map(|o| o.editions.join(", "))
        .unwrap_or_default();

    println!("{} Recipe found for {}", "✓".green(), dataset_id.bold());
    println!("  Recipe:   {}", recipe.recipe_id);
    println!("  Alias:    {}", recipe.alias_name);
    println!("  Format:   {}", details.format.as_deref().unwrap_or("unknown"));
    if !editions.is_empty() {
        println!("  Editions: {}", editions);
    }
    println!("  ({} recipes in catalog)", catalog_size);

    Ok(())
}
