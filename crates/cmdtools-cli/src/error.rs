//! Error types for the CMD loader
//!
//! Every remote call checks its expected status code and converts anything
//! else into one of these variants immediately. Messages are user-facing:
//! they are printed as-is when a run aborts.

use thiserror::Error;

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Error type for every stage of the upload pipeline
#[derive(Error, Debug)]
pub enum CliError {
    /// Login endpoint rejected the credentials or failed
    #[error("Authentication failed: login returned HTTP {status}. Check FLORENCE_USERNAME and FLORENCE_PASSWORD (or the credentials file).")]
    Authentication { status: u16 },

    /// No recipe declares the requested dataset as its output
    #[error("No recipe exists for dataset '{0}'. The dataset must be registered in the recipe API before a v4 can be loaded.")]
    RecipeNotFound(String),

    /// A catalog, listing or lookup endpoint answered with an unexpected status
    #[error("{endpoint} returned HTTP {status}")]
    RemoteApi { endpoint: String, status: u16 },

    /// A chunk POST was refused; the whole upload is abandoned
    #[error("Upload failed on chunk {chunk} of {total_chunks}: upload endpoint returned HTTP {status}")]
    Upload {
        chunk: u64,
        total_chunks: u64,
        status: u16,
    },

    /// A client-side guard refused to continue
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The state transition to submitted was refused by the server
    #[error("Job {job_id} was not submitted: server returned HTTP {status}")]
    SubmitRejected { job_id: String, status: u16 },

    /// A response parsed, but did not contain what the protocol promises
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    /// The source file has no bytes to upload
    #[error("File '{0}' is empty; there is nothing to upload.")]
    EmptyFile(String),

    /// Credentials are missing or unreadable
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables and command-line flags.")]
    Config(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// HTTP request failed before a response was received
    #[error("Network request failed: {0}. Check your connection and the API root URL.")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create a remote API error for an endpoint and status
    pub fn remote(endpoint: impl Into<String>, status: u16) -> Self {
        Self::RemoteApi {
            endpoint: endpoint.into(),
            status,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a credentials error
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials(msg.into())
    }

    /// Create a precondition error
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
