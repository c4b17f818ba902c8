//! HTTP transport shared by every remote call
//!
//! All requests go through [`Transport`], which makes it the one place where
//! timeout, TLS and retry policy live. The default policy performs no retries.

use crate::config::LoaderConfig;
use crate::credentials::AccessToken;
use crate::error::Result;
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Header carrying the access token on authenticated calls.
pub const TOKEN_HEADER: &str = "X-Florence-Token";

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;

/// Retry behaviour for transient failures
///
/// Connection errors, timeouts and 5xx responses are retried up to
/// `max_retries` times, doubling the delay after each attempt. Requests that
/// create a resource go through [`Transport::post_json_once`] and are never
/// retried, since a lost response does not mean the resource was not created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Status and body of a completed request
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    body: String,
}

impl Response {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Thin wrapper over `reqwest::Client`
#[derive(Clone)]
pub struct Transport {
    client: Client,
    retry: RetryPolicy,
}

impl Transport {
    /// Build the HTTP client from loader configuration
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        if config.accept_invalid_certs {
            warn!("TLS certificate verification is disabled; only use this against non-production endpoints");
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            retry: config.retry,
        })
    }

    pub async fn get(
        &self,
        url: &str,
        token: Option<&AccessToken>,
        query: &[(&str, String)],
    ) -> Result<Response> {
        self.send(Method::GET, url, self.retry.max_retries, || {
            self.request(Method::GET, url, token).query(query)
        })
        .await
    }

    pub async fn post_json<B>(&self, url: &str, token: Option<&AccessToken>, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, url, self.retry.max_retries, || {
            self.request(Method::POST, url, token).json(body)
        })
        .await
    }

    /// POST a JSON body exactly once, whatever the retry policy
    pub async fn post_json_once<B>(
        &self,
        url: &str,
        token: Option<&AccessToken>,
        body: &B,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, url, 0, || {
            self.request(Method::POST, url, token).json(body)
        })
        .await
    }

    /// POST a multipart form
    ///
    /// `form` is called once per attempt because a sent form cannot be reused.
    pub async fn post_multipart<F>(
        &self,
        url: &str,
        token: Option<&AccessToken>,
        query: &[(&str, String)],
        form: F,
    ) -> Result<Response>
    where
        F: Fn() -> Form,
    {
        self.send(Method::POST, url, self.retry.max_retries, || {
            self.request(Method::POST, url, token)
                .query(query)
                .multipart(form())
        })
        .await
    }

    pub async fn put_json<B>(&self, url: &str, token: Option<&AccessToken>, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::PUT, url, self.retry.max_retries, || {
            self.request(Method::PUT, url, token).json(body)
        })
        .await
    }

    fn request(&self, method: Method, url: &str, token: Option<&AccessToken>) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match token {
            Some(token) => builder.header(TOKEN_HEADER, token.expose()),
            None => builder,
        }
    }

    async fn send<F>(&self, method: Method, url: &str, max_retries: u32, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let path = path_for_logs(url);
        let mut attempt = 0;

        loop {
            match build().send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_server_error() && attempt < max_retries {
                        let delay = self.retry.backoff(attempt);
                        warn!(%method, path = %path, status = status.as_u16(), attempt = attempt + 1, ?delay, "Server error, retrying");
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    let body = response.text().await?;
                    debug!(%method, path = %path, status = status.as_u16(), "Request completed");
                    return Ok(Response { status, body });
                },
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < max_retries => {
                    let delay = self.retry.backoff(attempt);
                    warn!(%method, path = %path, error = %e, attempt = attempt + 1, ?delay, "Request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Only the path of a URL is logged; hosts and query strings stay out of logs
fn path_for_logs(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| "<invalid url>".to_string())
}
