//! Exchange login credentials for an access token

use crate::api::{endpoints, LoginRequest, Transport};
use crate::credentials::{AccessToken, Credentials};
use crate::error::{CliError, Result};
use reqwest::StatusCode;
use tracing::{info, instrument};

/// Logs in once per run
pub struct Authenticator {
    transport: Transport,
    login_url: String,
}

impl Authenticator {
    pub fn new(transport: Transport, api_root: &str) -> Self {
        Self {
            transport,
            login_url: endpoints::login_url(api_root),
        }
    }

    /// POST the credentials as JSON and return the token
    ///
    /// Only HTTP 200 counts as success. The body is the token wrapped in one
    /// layer of double quotes.
    #[instrument(skip_all)]
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<AccessToken> {
        let body = LoginRequest {
            email: credentials.identity(),
            password: credentials.secret(),
        };

        let response = self.transport.post_json(&self.login_url, None, &body).await?;

        if response.status() != StatusCode::OK {
            return Err(CliError::Authentication {
                status: response.status_code(),
            });
        }

        let token = strip_quotes(response.body().trim());
        if token.is_empty() {
            return Err(CliError::invalid_response("login succeeded but returned an empty token"));
        }

        info!("Authenticated");
        Ok(AccessToken::new(token))
    }
}

/// Remove one surrounding pair of quote characters, if present
fn strip_quotes(raw: &str) -> &str {
    let raw = raw.strip_prefix('"').unwrap_or(raw);
    raw.strip_suffix('"').unwrap_or(raw)
}
