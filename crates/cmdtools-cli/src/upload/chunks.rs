//! Temporary chunk files
//!
//! The source file is cut into one file per chunk inside a scratch directory.
//! The directory is removed when [`ChunkFiles`] is dropped, so chunk files
//! never outlive the upload call, whether it succeeds or fails.

use crate::error::Result;
use crate::upload::session::{ChunkSpec, ChunkUploadSession};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Prefix of the scratch directory created next to the source file.
const SCRATCH_PREFIX: &str = ".cmdload-chunks-";

/// One chunk written to disk
#[derive(Debug, Clone)]
pub struct ChunkFile {
    pub spec: ChunkSpec,
    pub path: PathBuf,
}

impl ChunkFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// All chunk files of one upload session
pub struct ChunkFiles {
    dir: TempDir,
    files: Vec<ChunkFile>,
}

impl ChunkFiles {
    /// Cut `source` into chunk files inside a new directory under `scratch_parent`
    pub async fn split(
        source: &Path,
        scratch_parent: &Path,
        session: &ChunkUploadSession,
    ) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(scratch_parent)?;

        let mut reader = tokio::fs::File::open(source).await?;
        let mut files = Vec::with_capacity(session.total_chunks as usize);

        for spec in session.chunks() {
            let mut buffer = Vec::with_capacity(spec.len as usize);
            (&mut reader).take(spec.len).read_to_end(&mut buffer).await?;

            if buffer.len() as u64 != spec.len {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "'{}' shrank while being chunked (chunk {} expected {} bytes, read {})",
                        source.display(),
                        spec.number,
                        spec.len,
                        buffer.len()
                    ),
                )
                .into());
            }

            let path = dir.path().join(format!("temp-file-part-{}", spec.number));
            tokio::fs::write(&path, &buffer).await?;
            files.push(ChunkFile { spec, path });
        }

        debug!(chunks = files.len(), dir = %dir.path().display(), "Wrote chunk files");
        Ok(Self { dir, files })
    }

    pub fn files(&self) -> &[ChunkFile] {
        &self.files
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the scratch directory, reporting any failure
    pub fn close(self) -> Result<()> {
        self.dir.close()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn session(total: u64, chunk: u64) -> ChunkUploadSession {
        let started = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ChunkUploadSession::new("v4.csv", total, chunk, started)
    }

    #[tokio::test]
    async fn test_split_writes_ordered_chunks() {
        let workdir = tempfile::tempdir().unwrap();
        let source = workdir.path().join("v4.csv");
        std::fs::write(&source, b"abcdefghijk").unwrap();

        let chunks = ChunkFiles::split(&source, workdir.path(), &session(11, 4))
            .await
            .unwrap();

        let contents: Vec<Vec<u8>> = chunks
            .files()
            .iter()
            .map(|c| std::fs::read(&c.path).unwrap())
            .collect();
        assert_eq!(contents, vec![b"abcd".to_vec(), b"efgh".to_vec(), b"ijk".to_vec()]);
        assert_eq!(chunks.files()[0].file_name(), "temp-file-part-1");
    }

    #[tokio::test]
    async fn test_scratch_dir_removed_on_drop_and_close() {
        let workdir = tempfile::tempdir().unwrap();
        let source = workdir.path().join("v4.csv");
        std::fs::write(&source, b"0123456789").unwrap();

        let dropped = ChunkFiles::split(&source, workdir.path(), &session(10, 3))
            .await
            .unwrap();
        let dropped_dir = dropped.dir().to_path_buf();
        assert!(dropped_dir.exists());
        drop(dropped);
        assert!(!dropped_dir.exists());

        let closed = ChunkFiles::split(&source, workdir.path(), &session(10, 3))
            .await
            .unwrap();
        let closed_dir = closed.dir().to_path_buf();
        closed.close().unwrap();
        assert!(!closed_dir.exists());
    }

    #[tokio::test]
    async fn test_truncated_source_is_an_error() {
        let workdir = tempfile::tempdir().unwrap();
        let source = workdir.path().join("v4.csv");
        std::fs::write(&source, b"0123").unwrap();

        let result = ChunkFiles::split(&source, workdir.path(), &session(10, 3)).await;
        assert!(result.is_err());

        let leftovers = std::fs::read_dir(workdir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "only the source file should remain");
    }
}
