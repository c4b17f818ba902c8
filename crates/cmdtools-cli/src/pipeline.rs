//! The full load: authenticate, check, upload, create job, submit
//!
//! Each stage depends on the previous one and the first failure ends the
//! run. Nothing is retried or rolled back at this level.

use crate::api::Transport;
use crate::auth::Authenticator;
use crate::config::LoaderConfig;
use crate::credentials::{AccessToken, Credentials};
use crate::error::Result;
use crate::instances::InstanceClient;
use crate::jobs::{ConsistencyWarning, JobOrchestrator};
use crate::recipes::RecipeResolver;
use crate::upload::{ChunkedUploader, StorageLocator};
use std::path::Path;
use tracing::{info, instrument};

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub dataset_id: String,
    pub recipe_id: String,
    pub job_id: String,
    pub instance_id: Option<String>,
    pub storage_locator: StorageLocator,
    pub warning: Option<ConsistencyWarning>,
}

/// Owns the configuration and transport shared by every stage
pub struct Pipeline {
    config: LoaderConfig,
    transport: Transport,
}

impl Pipeline {
    pub fn new(config: LoaderConfig) -> Result<Self> {
        config.validate()?;
        let transport = Transport::new(&config)?;
        Ok(Self { config, transport })
    }

    pub async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken> {
        Authenticator::new(self.transport.clone(), self.config.api_root())
            .authenticate(credentials)
            .await
    }

    pub fn recipes(&self, token: &AccessToken) -> RecipeResolver {
        RecipeResolver::new(self.transport.clone(), &self.config, token.clone())
    }

    pub fn uploader(&self, token: &AccessToken) -> ChunkedUploader {
        ChunkedUploader::new(self.transport.clone(), &self.config, token.clone())
    }

    pub fn jobs(&self, token: &AccessToken) -> JobOrchestrator {
        JobOrchestrator::new(self.transport.clone(), &self.config, token.clone())
    }

    pub fn instances(&self, token: &AccessToken) -> InstanceClient {
        InstanceClient::new(self.transport.clone(), &self.config, token.clone())
    }

    /// Load `v4_path` as a new import job for `dataset_id` and submit it
    #[instrument(skip(self, credentials, v4_path), fields(file = %v4_path.display()))]
    pub async fn run(
        &self,
        credentials: &Credentials,
        dataset_id: &str,
        v4_path: &Path,
    ) -> Result<RunSummary> {
        let token = self.authenticate(credentials).await?;

        let recipes = self.recipes(&token);
        recipes.check_exists(dataset_id).await?;

        let storage_locator = self.uploader(&token).upload(v4_path).await?;

        let recipe = recipes.resolve(dataset_id).await?;
        let jobs = self.jobs(&token);
        let created = jobs.create_job(&recipe, &storage_locator).await?;

        jobs.submit(&created.job_id).await?;

        info!(job_id = %created.job_id, "Pipeline complete");
        Ok(RunSummary {
            dataset_id: dataset_id.to_string(),
            recipe_id: recipe.recipe_id,
            job_id: created.job_id,
            instance_id: created.instance_id,
            storage_locator,
            warning: created.warning,
        })
    }
}
