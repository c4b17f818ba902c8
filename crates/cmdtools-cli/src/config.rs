//! Configuration for the CMD loader
//!
//! Components never read the environment themselves: a `LoaderConfig` is
//! built once (defaults, then environment, then command-line flags) and passed
//! to each constructor.

use crate::api::transport::RetryPolicy;
use crate::error::{CliError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

// ============================================================================
// Loader Configuration Constants
// ============================================================================

/// Default publishing API root.
pub const DEFAULT_API_ROOT: &str = "https://publishing.develop.onsdigital.co.uk";

/// Default base URL of the bucket that receives assembled uploads.
pub const DEFAULT_BUCKET_URL: &str =
    "https://s3-eu-west-1.amazonaws.com/ons-dp-develop-publishing-uploaded-datasets";

/// Default timeout for API requests in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default upload chunk size (5 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Default page size for catalog and listing requests.
pub const DEFAULT_PAGE_LIMIT: u64 = 1000;

/// Loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// API root every endpoint URL is derived from
    pub api_root: String,

    /// Base URL under which uploaded files become addressable
    pub bucket_url: String,

    /// Skip TLS certificate verification (non-production endpoints only)
    pub accept_invalid_certs: bool,

    /// Per-request timeout
    pub timeout: Duration,

    /// Retry behaviour of the transport layer
    pub retry: RetryPolicy,

    /// Upload chunk size in bytes
    pub chunk_size: u64,

    /// Page size for paginated endpoints
    pub page_limit: u64,

    /// Where temporary chunk files are written (defaults to the file's directory)
    pub scratch_dir: Option<PathBuf>,

    /// Draw a progress bar while uploading
    pub show_progress: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            bucket_url: DEFAULT_BUCKET_URL.to_string(),
            accept_invalid_certs: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            page_limit: DEFAULT_PAGE_LIMIT,
            scratch_dir: None,
            show_progress: false,
        }
    }
}

impl LoaderConfig {
    /// Load config from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(root) = std::env::var("CMD_API_ROOT") {
            config.set_api_root(root);
        }

        if let Ok(bucket) = std::env::var("CMD_DATASET_UPLOAD_BUCKET") {
            config.set_bucket_url(bucket);
        }

        if let Some(insecure) = env_parse::<bool>("CMDLOAD_ACCEPT_INVALID_CERTS")? {
            config.accept_invalid_certs = insecure;
        }

        if let Some(secs) = env_parse::<u64>("CMDLOAD_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(retries) = env_parse::<u32>("CMDLOAD_MAX_RETRIES")? {
            config.retry.max_retries = retries;
        }

        if let Some(chunk_size) = env_parse::<u64>("CMDLOAD_CHUNK_SIZE")? {
            config.chunk_size = chunk_size;
        }

        if let Some(limit) = env_parse::<u64>("CMDLOAD_PAGE_LIMIT")? {
            config.page_limit = limit;
        }

        if let Ok(dir) = std::env::var("CMDLOAD_SCRATCH_DIR") {
            config.scratch_dir = Some(PathBuf::from(dir));
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values no run could succeed with
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("API root", &self.api_root), ("bucket URL", &self.bucket_url)] {
            Url::parse(value)
                .map_err(|e| CliError::config(format!("{} '{}' is not a valid URL ({})", name, value, e)))?;
        }

        if self.chunk_size == 0 {
            return Err(CliError::config("chunk size must be greater than zero"));
        }

        if self.page_limit == 0 {
            return Err(CliError::config("page limit must be greater than zero"));
        }

        Ok(())
    }

    /// Set the API root, dropping any trailing slash
    pub fn set_api_root(&mut self, root: impl Into<String>) {
        self.api_root = trim_slash(root.into());
    }

    /// Set the bucket URL, dropping any trailing slash
    pub fn set_bucket_url(&mut self, url: impl Into<String>) {
        self.bucket_url = trim_slash(url.into());
    }

    /// Get the API root
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Get the bucket URL
    pub fn bucket_url(&self) -> &str {
        &self.bucket_url
    }
}

fn trim_slash(value: String) -> String {
    value.trim_end_matches('/').to_string()
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| CliError::config(format!("{}='{}' is invalid: {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}
