//! Recipe catalog lookup
//!
//! A recipe ties a dataset id to the file alias an import job must use. The
//! catalog is fetched at most once per resolver and kept for its lifetime;
//! constructing a new resolver is the only way to refetch.

use crate::api::{endpoints, pagination, RecipeItem, Transport};
use crate::config::LoaderConfig;
use crate::credentials::AccessToken;
use crate::error::{CliError, Result};
use reqwest::StatusCode;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// The parts of a recipe a job needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub recipe_id: String,
    pub dataset_id: String,
    pub alias_name: String,
}

/// Every recipe known to the recipe API, in catalog order
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    items: Vec<RecipeItem>,
}

impl RecipeCatalog {
    pub fn new(items: Vec<RecipeItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[RecipeItem] {
        &self.items
    }

    /// First recipe whose first output instance produces `dataset_id`
    pub fn find(&self, dataset_id: &str) -> Option<&RecipeItem> {
        self.items
            .iter()
            .find(|item| item.output_dataset_id() == Some(dataset_id))
    }

    /// Resolve `dataset_id` to the recipe a job should reference
    pub fn resolve(&self, dataset_id: &str) -> Result<Recipe> {
        let item = self
            .find(dataset_id)
            .ok_or_else(|| CliError::RecipeNotFound(dataset_id.to_string()))?;

        let alias_name = item.file_alias().ok_or_else(|| {
            CliError::invalid_response(format!(
                "recipe {} for dataset '{}' declares no files",
                item.id, dataset_id
            ))
        })?;

        Ok(Recipe {
            recipe_id: item.id.clone(),
            dataset_id: dataset_id.to_string(),
            alias_name: alias_name.to_string(),
        })
    }
}

/// Fetches and caches the recipe catalog
pub struct RecipeResolver {
    transport: Transport,
    api_root: String,
    token: AccessToken,
    page_limit: u64,
    catalog: OnceCell<RecipeCatalog>,
}

impl RecipeResolver {
    pub fn new(transport: Transport, config: &LoaderConfig, token: AccessToken) -> Self {
        Self {
            transport,
            api_root: config.api_root().to_string(),
            token,
            page_limit: config.page_limit,
            catalog: OnceCell::new(),
        }
    }

    /// The catalog, fetched on first use
    pub async fn catalog(&self) -> Result<&RecipeCatalog> {
        self.catalog.get_or_try_init(|| self.fetch_catalog()).await
    }

    async fn fetch_catalog(&self) -> Result<RecipeCatalog> {
        let url = endpoints::recipes_url(&self.api_root);
        let items: Vec<RecipeItem> =
            pagination::fetch_all(&self.transport, &url, &self.token, self.page_limit, "Recipe API")
                .await?;

        info!(recipes = items.len(), "Fetched recipe catalog");
        Ok(RecipeCatalog::new(items))
    }

    /// Resolve a dataset id to its recipe (first match in catalog order)
    pub async fn resolve(&self, dataset_id: &str) -> Result<Recipe> {
        let recipe = self.catalog().await?.resolve(dataset_id)?;
        debug!(dataset_id, recipe_id = %recipe.recipe_id, alias = %recipe.alias_name, "Resolved recipe");
        Ok(recipe)
    }

    /// Fail with `RecipeNotFound` unless some recipe produces `dataset_id`
    ///
    /// Run before uploading so no upload is spent on an unregistered dataset.
    pub async fn check_exists(&self, dataset_id: &str) -> Result<()> {
        match self.catalog().await?.find(dataset_id) {
            Some(_) => Ok(()),
            None => Err(CliError::RecipeNotFound(dataset_id.to_string())),
        }
    }

    /// Look up a single recipe by its id, bypassing the catalog
    pub async fn fetch_by_id(&self, recipe_id: &str) -> Result<RecipeItem> {
        let url = endpoints::recipe_url(&self.api_root, recipe_id);
        let response = self.transport.get(&url, Some(&self.token), &[]).await?;

        if response.status() != StatusCode::OK {
            return Err(CliError::remote(format!("/recipes/{}", recipe_id), response.status_code()));
        }

        response.json()
    }
}
