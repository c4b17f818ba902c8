//! Import job lifecycle
//!
//! Creating a job does not return its id, so creation is a two-step protocol:
//! POST the job, then take the last item of the full job listing as the job
//! just created. The only transition this client performs is
//! `created -> submitted`.

use crate::api::{
    endpoints, pagination, JobDocument, JobFile, JobState, JobStateUpdate, NewJob, Transport,
};
use crate::config::LoaderConfig;
use crate::credentials::AccessToken;
use crate::error::{CliError, Result};
use crate::recipes::Recipe;
use crate::upload::StorageLocator;
use reqwest::StatusCode;
use std::fmt;
use tracing::{info, instrument, warn};

/// The listing's latest job does not reference the recipe just posted
///
/// The job was already accepted, so this is reported rather than raised.
/// It usually means another process created a job at the same time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyWarning {
    pub expected_recipe: String,
    pub actual_recipe: String,
    pub job_id: String,
}

impl fmt::Display for ConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "latest job {} references recipe '{}' but recipe '{}' was just submitted; another job may have been created concurrently",
            self.job_id, self.actual_recipe, self.expected_recipe
        )
    }
}

/// Outcome of `create_job`
#[derive(Debug, Clone)]
pub struct CreatedJob {
    pub job_id: String,
    pub instance_id: Option<String>,
    pub warning: Option<ConsistencyWarning>,
}

/// Talks to the jobs API
pub struct JobOrchestrator {
    transport: Transport,
    api_root: String,
    token: AccessToken,
    page_limit: u64,
}

impl JobOrchestrator {
    pub fn new(transport: Transport, config: &LoaderConfig, token: AccessToken) -> Self {
        Self {
            transport,
            api_root: config.api_root().to_string(),
            token,
            page_limit: config.page_limit,
        }
    }

    /// Create a job for `recipe` pointing at the uploaded file
    #[instrument(skip(self, recipe, locator), fields(recipe_id = %recipe.recipe_id))]
    pub async fn create_job(&self, recipe: &Recipe, locator: &StorageLocator) -> Result<CreatedJob> {
        let job = NewJob {
            recipe: recipe.recipe_id.clone(),
            state: JobState::Created,
            links: serde_json::Map::new(),
            files: vec![JobFile {
                alias_name: recipe.alias_name.clone(),
                url: locator.as_str().to_string(),
            }],
        };

        let url = endpoints::jobs_url(&self.api_root);
        // Sent once: a retried create could register a second job
        let response = self.transport.post_json_once(&url, Some(&self.token), &job).await?;

        if response.status() != StatusCode::CREATED {
            return Err(CliError::remote("Create job", response.status_code()));
        }

        let latest = self.latest_job().await?;
        let warning = (latest.recipe != recipe.recipe_id).then(|| ConsistencyWarning {
            expected_recipe: recipe.recipe_id.clone(),
            actual_recipe: latest.recipe.clone(),
            job_id: latest.id.clone(),
        });

        if let Some(w) = &warning {
            warn!(
                job_id = %w.job_id,
                expected_recipe = %w.expected_recipe,
                actual_recipe = %w.actual_recipe,
                "Latest job does not match the submitted recipe"
            );
        }

        info!(job_id = %latest.id, "Created job");
        Ok(CreatedJob {
            instance_id: latest.instance_id().map(str::to_string),
            job_id: latest.id,
            warning,
        })
    }

    /// Every job in listing order, following pagination
    pub async fn list_jobs(&self) -> Result<Vec<JobDocument>> {
        let url = endpoints::jobs_url(&self.api_root);
        pagination::fetch_all(&self.transport, &url, &self.token, self.page_limit, "List jobs").await
    }

    /// The last job of the full listing
    ///
    /// Listing order is assumed to be creation order; the API does not
    /// guarantee it.
    pub async fn latest_job(&self) -> Result<JobDocument> {
        self.list_jobs()
            .await?
            .pop()
            .ok_or_else(|| CliError::invalid_response("job listing is empty after creating a job"))
    }

    pub async fn get_job(&self, job_id: &str) -> Result<JobDocument> {
        let url = endpoints::job_url(&self.api_root, job_id);
        let response = self.transport.get(&url, Some(&self.token), &[]).await?;

        if response.status() != StatusCode::OK {
            return Err(CliError::remote(format!("Get job {}", job_id), response.status_code()));
        }

        response.json()
    }

    /// Move a job from created to submitted
    ///
    /// The job must have at least one file and still be in the created
    /// state; both are checked before the PUT is sent.
    #[instrument(skip(self))]
    pub async fn submit(&self, job_id: &str) -> Result<()> {
        let job = self.get_job(job_id).await?;

        if job.files.is_empty() {
            return Err(CliError::precondition(format!(
                "no file attached to job {}",
                job_id
            )));
        }

        if let Some(state) = job.state.filter(|s| *s != JobState::Created) {
            return Err(CliError::precondition(format!(
                "job {} is in state '{}', only created jobs can be submitted",
                job_id, state
            )));
        }

        let url = endpoints::job_url(&self.api_root, job_id);
        let body = JobStateUpdate {
            state: JobState::Submitted,
        };
        let response = self.transport.put_json(&url, Some(&self.token), &body).await?;

        if response.status() != StatusCode::OK {
            warn!(job_id, status = response.status_code(), "Submit was rejected");
            return Err(CliError::SubmitRejected {
                job_id: job_id.to_string(),
                status: response.status_code(),
            });
        }

        info!(job_id, "Submitted job");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::api::RetryPolicy;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn orchestrator(server: &MockServer, page_limit: u64) -> JobOrchestrator {
        let mut config = LoaderConfig::default();
        config.set_api_root(server.uri());
        config.page_limit = page_limit;
        let transport = Transport::new(&config).unwrap();
        JobOrchestrator::new(transport, &config, AccessToken::new("tok"))
    }

    fn recipe() -> Recipe {
        Recipe {
            recipe_id: "r-1".to_string(),
            dataset_id: "cpih01".to_string(),
            alias_name: "CPIH".to_string(),
        }
    }

    fn locator() -> StorageLocator {
        StorageLocator::new("https://bucket.example.com", "070324140209-v4csv")
    }

    fn job(id: &str, recipe: &str) -> Value {
        json!({
            "id": id,
            "recipe": recipe,
            "state": "created",
            "links": {"instances": [{"id": format!("inst-{}", id), "href": "x"}]},
            "files": [{"alias_name": "CPIH", "url": "https://bucket.example.com/f"}]
        })
    }

    async fn mount_listing(server: &MockServer, jobs: Vec<Value>) {
        let total = jobs.len();
        Mock::given(method("GET"))
            .and(path("/dataset/jobs"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"items": jobs, "total_count": total})),
            )
            .mount(server)
            .await;
    }

    async fn mount_create(server: &MockServer, status: u16) {
        Mock::given(method("POST"))
            .and(path("/dataset/jobs"))
            .and(body_json(json!({
                "recipe": "r-1",
                "state": "created",
                "links": {},
                "files": [{"alias_name": "CPIH", "url": "https://bucket.example.com/070324140209-v4csv"}]
            })))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_create_job_returns_latest_listed_job() {
        let mock_server = MockServer::start().await;
        mount_create(&mock_server, 201).await;
        mount_listing(&mock_server, vec![job("j-1", "r-9"), job("j-2", "r-1")]).await;

        let created = orchestrator(&mock_server, 1000)
            .create_job(&recipe(), &locator())
            .await
            .unwrap();

        assert_eq!(created.job_id, "j-2");
        assert_eq!(created.instance_id.as_deref(), Some("inst-j-2"));
        assert!(created.warning.is_none());
    }

    #[tokio::test]
    async fn test_recipe_mismatch_is_a_warning_not_an_error() {
        let mock_server = MockServer::start().await;
        mount_create(&mock_server, 201).await;
        mount_listing(&mock_server, vec![job("j-1", "r-1"), job("j-2", "r-other")]).await;

        let created = orchestrator(&mock_server, 1000)
            .create_job(&recipe(), &locator())
            .await
            .unwrap();

        assert_eq!(created.job_id, "j-2");
        let warning = created.warning.unwrap();
        assert_eq!(warning.expected_recipe, "r-1");
        assert_eq!(warning.actual_recipe, "r-other");
        assert!(warning.to_string().contains("j-2"));
    }

    #[tokio::test]
    async fn test_create_job_requires_201() {
        let mock_server = MockServer::start().await;
        mount_create(&mock_server, 200).await;

        let err = orchestrator(&mock_server, 1000)
            .create_job(&recipe(), &locator())
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::RemoteApi { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_create_job_is_not_retried() {
        let mock_server = MockServer::start().await;
        mount_create(&mock_server, 503).await;

        let mut config = LoaderConfig::default();
        config.set_api_root(mock_server.uri());
        config.retry = RetryPolicy {
            max_retries: 2,
            initial_backoff: std::time::Duration::from_millis(1),
        };
        let transport = Transport::new(&config).unwrap();

        let err = JobOrchestrator::new(transport, &config, AccessToken::new("tok"))
            .create_job(&recipe(), &locator())
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::RemoteApi { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_empty_listing_after_create() {
        let mock_server = MockServer::start().await;
        mount_create(&mock_server, 201).await;
        mount_listing(&mock_server, vec![]).await;

        let err = orchestrator(&mock_server, 1000)
            .create_job(&recipe(), &locator())
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_list_jobs_concatenates_pages() {
        let mock_server = MockServer::start().await;
        for (offset, ids) in [(0, ["a", "b"]), (2, ["c", "d"])] {
            Mock::given(method("GET"))
                .and(path("/dataset/jobs"))
                .and(query_param("offset", offset.to_string()))
                .and(query_param("limit", "2"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "items": ids.iter().map(|id| job(id, "r")).collect::<Vec<_>>(),
                    "total_count": 5
                })))
                .expect(1)
                .mount(&mock_server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/dataset/jobs"))
            .and(query_param("offset", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [job("e", "r")],
                "total_count": 5
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let jobs = orchestrator(&mock_server, 2).list_jobs().await.unwrap();
        let ids: Vec<_> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_submit_without_files_sends_no_put() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dataset/jobs/j-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "j-1", "recipe": "r-1", "state": "created", "files": []
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = orchestrator(&mock_server, 1000).submit("j-1").await.unwrap_err();
        assert!(matches!(err, CliError::Precondition(ref msg) if msg.contains("no file attached")));
    }

    #[tokio::test]
    async fn test_submit_refuses_already_submitted_job() {
        let mock_server = MockServer::start().await;
        let mut submitted = job("j-1", "r-1");
        submitted["state"] = json!("submitted");
        Mock::given(method("GET"))
            .and(path("/dataset/jobs/j-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(submitted))
            .mount(&mock_server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = orchestrator(&mock_server, 1000).submit("j-1").await.unwrap_err();
        assert!(matches!(err, CliError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_submit_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dataset/jobs/j-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(job("j-1", "r-1")))
            .mount(&mock_server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/dataset/jobs/j-1"))
            .and(body_json(json!({"state": "submitted"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        orchestrator(&mock_server, 1000).submit("j-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_rejected_surfaces_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dataset/jobs/j-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(job("j-1", "r-1")))
            .mount(&mock_server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/dataset/jobs/j-1"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&mock_server)
            .await;

        let err = orchestrator(&mock_server, 1000).submit("j-1").await.unwrap_err();
        assert!(matches!(
            err,
            CliError::SubmitRejected { ref job_id, status: 409 } if job_id == "j-1"
        ));
    }

    #[tokio::test]
    async fn test_get_job_not_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dataset/jobs/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let err = orchestrator(&mock_server, 1000).get_job("missing").await.unwrap_err();
        assert!(matches!(err, CliError::RemoteApi { status: 404, .. }));
    }
}
