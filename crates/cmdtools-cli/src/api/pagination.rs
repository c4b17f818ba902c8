//! Offset pagination for listing endpoints

use crate::api::transport::Transport;
use crate::api::types::Page;
use crate::credentials::AccessToken;
use crate::error::{CliError, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Fetch every item of a paginated listing, in listing order
///
/// The first page is requested at offset 0. While fewer items than the
/// reported `total_count` have been collected, the offset advances by `limit`.
/// A page without `total_count`, or an empty page, ends the listing.
pub async fn fetch_all<T>(
    transport: &Transport,
    url: &str,
    token: &AccessToken,
    limit: u64,
    endpoint: &str,
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    let mut items: Vec<T> = Vec::new();
    let mut offset = 0u64;

    loop {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        let response = transport.get(url, Some(token), &query).await?;

        if response.status() != StatusCode::OK {
            return Err(CliError::remote(endpoint, response.status_code()));
        }

        let page: Page<T> = response.json()?;
        let received = page.items.len();
        items.extend(page.items);

        debug!(endpoint, offset, received, collected = items.len(), total = ?page.total_count, "Fetched page");

        match page.total_count {
            Some(total) if (items.len() as u64) < total && received > 0 => offset += limit,
            _ => break,
        }
    }

    Ok(items)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::LoaderConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_page(server: &MockServer, offset: u64, ids: &[&str], total: u64) {
        let items: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
        Mock::given(method("GET"))
            .and(path("/dataset/jobs"))
            .and(query_param("offset", offset.to_string()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"items": items, "total_count": total})),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    #[derive(Debug, serde::Deserialize)]
    struct Item {
        id: String,
    }

    #[tokio::test]
    async fn test_collects_all_pages_in_order() {
        let mock_server = MockServer::start().await;
        mount_page(&mock_server, 0, &["a", "b"], 5).await;
        mount_page(&mock_server, 2, &["c", "d"], 5).await;
        mount_page(&mock_server, 4, &["e"], 5).await;

        let transport = Transport::new(&LoaderConfig::default()).unwrap();
        let url = format!("{}/dataset/jobs", mock_server.uri());
        let items: Vec<Item> = fetch_all(&transport, &url, &AccessToken::new("t"), 2, "/dataset/jobs")
            .await
            .unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_single_page_when_total_within_limit() {
        let mock_server = MockServer::start().await;
        mount_page(&mock_server, 0, &["a", "b"], 2).await;

        let transport = Transport::new(&LoaderConfig::default()).unwrap();
        let url = format!("{}/dataset/jobs", mock_server.uri());
        let items: Vec<Item> = fetch_all(&transport, &url, &AccessToken::new("t"), 1000, "/dataset/jobs")
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_non_200_page_is_remote_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dataset/jobs"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let transport = Transport::new(&LoaderConfig::default()).unwrap();
        let url = format!("{}/dataset/jobs", mock_server.uri());
        let err = fetch_all::<Item>(&transport, &url, &AccessToken::new("t"), 1000, "/dataset/jobs")
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::RemoteApi { status: 401, .. }));
    }
}
