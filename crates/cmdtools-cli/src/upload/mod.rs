//! Chunked upload of v4 files
//!
//! A file is cut into fixed-size chunks which are POSTed one after another to
//! the upload endpoint with resumable-upload query parameters. Chunks go out
//! strictly in order and the first failed chunk aborts the upload; the
//! service never sees a later chunk after a failure.

pub mod chunks;
pub mod session;

pub use chunks::{ChunkFile, ChunkFiles};
pub use session::{resumable_identifier, ChunkSpec, ChunkUploadSession};

use crate::api::{endpoints, Transport};
use crate::config::LoaderConfig;
use crate::credentials::AccessToken;
use crate::error::{CliError, Result};
use crate::progress::create_upload_progress;
use chrono::{Local, NaiveDateTime};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Public address of an uploaded file: `<bucket>/<resumableIdentifier>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocator(String);

impl StorageLocator {
    pub fn new(bucket_url: &str, resumable_identifier: &str) -> Self {
        Self(endpoints::storage_locator_url(bucket_url, resumable_identifier))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Uploads one file per call, chunk by chunk
pub struct ChunkedUploader {
    transport: Transport,
    upload_url: String,
    bucket_url: String,
    token: AccessToken,
    chunk_size: u64,
    scratch_dir: Option<PathBuf>,
    show_progress: bool,
}

impl ChunkedUploader {
    pub fn new(transport: Transport, config: &LoaderConfig, token: AccessToken) -> Self {
        Self {
            transport,
            upload_url: endpoints::upload_url(config.api_root()),
            bucket_url: config.bucket_url().to_string(),
            token,
            chunk_size: config.chunk_size,
            scratch_dir: config.scratch_dir.clone(),
            show_progress: config.show_progress,
        }
    }

    /// Upload `path`, stamping the identifier with the current local time
    pub async fn upload(&self, path: &Path) -> Result<StorageLocator> {
        self.upload_started_at(path, Local::now().naive_local()).await
    }

    /// Upload `path` with an explicit session start time
    #[instrument(skip(self, path), fields(file = %path.display()))]
    pub async fn upload_started_at(
        &self,
        path: &Path,
        started_at: NaiveDateTime,
    ) -> Result<StorageLocator> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("'{}' is not a regular file", path.display()),
            )
            .into());
        }
        if metadata.len() == 0 {
            return Err(CliError::EmptyFile(path.display().to_string()));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let session = ChunkUploadSession::new(file_name, metadata.len(), self.chunk_size, started_at);

        info!(
            identifier = %session.resumable_identifier,
            total_size = session.total_size,
            total_chunks = session.total_chunks,
            "Starting chunked upload"
        );

        let scratch_parent = self.scratch_parent(path);
        let chunks = ChunkFiles::split(path, &scratch_parent, &session).await?;

        let pb = create_upload_progress(session.total_size, &session.file_name, self.show_progress);
        for chunk in chunks.files() {
            if let Err(e) = self.upload_chunk(&session, chunk).await {
                pb.abandon();
                return Err(e);
            }
            pb.inc(chunk.spec.len);
        }
        pb.finish_and_clear();

        chunks.close()?;

        let locator = StorageLocator::new(&self.bucket_url, &session.resumable_identifier);
        info!(locator = %locator, "Upload complete");
        Ok(locator)
    }

    fn scratch_parent(&self, path: &Path) -> PathBuf {
        match (&self.scratch_dir, path.parent()) {
            (Some(dir), _) => dir.clone(),
            (None, Some(parent)) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    async fn upload_chunk(&self, session: &ChunkUploadSession, chunk: &ChunkFile) -> Result<()> {
        let bytes = tokio::fs::read(&chunk.path).await?;
        let part_name = chunk.file_name();
        let query = session.query_for(&chunk.spec);

        let response = self
            .transport
            .post_multipart(&self.upload_url, Some(&self.token), &query, || {
                Form::new().part("file", Part::bytes(bytes.clone()).file_name(part_name.clone()))
            })
            .await?;

        if response.status() != StatusCode::OK {
            return Err(CliError::Upload {
                chunk: chunk.spec.number,
                total_chunks: session.total_chunks,
                status: response.status_code(),
            });
        }

        debug!(
            chunk = chunk.spec.number,
            total_chunks = session.total_chunks,
            bytes = chunk.spec.len,
            "Chunk uploaded"
        );
        Ok(())
    }
}
