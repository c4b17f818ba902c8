//! Dataset instance lookups

use crate::api::{endpoints, pagination, InstanceDocument, Transport};
use crate::config::LoaderConfig;
use crate::credentials::AccessToken;
use crate::error::{CliError, Result};
use reqwest::StatusCode;

/// Read-only access to the instances API
pub struct InstanceClient {
    transport: Transport,
    api_root: String,
    token: AccessToken,
    page_limit: u64,
}

impl InstanceClient {
    pub fn new(transport: Transport, config: &LoaderConfig, token: AccessToken) -> Self {
        Self {
            transport,
            api_root: config.api_root().to_string(),
            token,
            page_limit: config.page_limit,
        }
    }

    /// Every instance in listing order, following pagination
    pub async fn list_instances(&self) -> Result<Vec<InstanceDocument>> {
        let url = endpoints::instances_url(&self.api_root);
        pagination::fetch_all(&self.transport, &url, &self.token, self.page_limit, "List instances")
            .await
    }

    pub async fn get_instance(&self, instance_id: &str) -> Result<InstanceDocument> {
        let url = endpoints::instance_url(&self.api_root, instance_id);
        let response = self.transport.get(&url, Some(&self.token), &[]).await?;

        if response.status() != StatusCode::OK {
            return Err(CliError::remote(
                format!("Get instance {}", instance_id),
                response.status_code(),
            ));
        }

        response.json()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, page_limit: u64) -> InstanceClient {
        let mut config = LoaderConfig::default();
        config.set_api_root(server.uri());
        config.page_limit = page_limit;
        let transport = Transport::new(&config).unwrap();
        InstanceClient::new(transport, &config, AccessToken::new("tok"))
    }

    #[tokio::test]
    async fn test_get_instance() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dataset/instances/inst-1"))
            .and(header("X-Florence-Token", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "inst-1",
                "state": "completed",
                "total_observations": 120,
                "total_inserted_observations": 120
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let instance = client(&mock_server, 1000).get_instance("inst-1").await.unwrap();
        assert_eq!(instance.state.as_deref(), Some("completed"));
        assert_eq!(instance.total_observations, Some(120));
    }

    #[tokio::test]
    async fn test_get_instance_non_200() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dataset/instances/nope"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server, 1000).get_instance("nope").await.unwrap_err();
        assert!(matches!(err, CliError::RemoteApi { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_list_instances_pages() {
        let mock_server = MockServer::start().await;
        for (offset, id) in [(0, "i-1"), (1, "i-2")] {
            Mock::given(method("GET"))
                .and(path("/dataset/instances"))
                .and(query_param("offset", offset.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "items": [{"id": id}],
                    "total_count": 2
                })))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let instances = client(&mock_server, 1).list_instances().await.unwrap();
        let ids: Vec<_> = instances.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["i-1", "i-2"]);
    }
}
