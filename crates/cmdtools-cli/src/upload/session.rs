//! Resumable upload session parameters
//!
//! Every chunk of one file carries the same `resumableIdentifier`; the upload
//! service reassembles chunks under it, and the assembled file becomes
//! addressable at `<bucket>/<resumableIdentifier>`.

use chrono::NaiveDateTime;

/// Value of `resumableType` for v4 files.
pub const RESUMABLE_TYPE: &str = "text/csv";

/// Value of `resumableRelativePath`.
pub const RESUMABLE_RELATIVE_PATH: &str = ".";

/// Timestamp prefix of the identifier (ddMMyyHHmmss).
pub const IDENTIFIER_TIMESTAMP_FORMAT: &str = "%d%m%y%H%M%S";

/// `<ddMMyyHHmmss>-<file name with dots removed>`
pub fn resumable_identifier(started_at: NaiveDateTime, file_name: &str) -> String {
    format!(
        "{}-{}",
        started_at.format(IDENTIFIER_TIMESTAMP_FORMAT),
        file_name.replace('.', "")
    )
}

/// Position of one chunk within the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    /// 1-based chunk number
    pub number: u64,
    pub offset: u64,
    pub len: u64,
}

/// Fixed parameters of one file's upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkUploadSession {
    pub file_name: String,
    pub total_size: u64,
    pub chunk_size: u64,
    pub total_chunks: u64,
    pub resumable_identifier: String,
}

impl ChunkUploadSession {
    pub fn new(
        file_name: impl Into<String>,
        total_size: u64,
        chunk_size: u64,
        started_at: NaiveDateTime,
    ) -> Self {
        let file_name = file_name.into();
        Self {
            resumable_identifier: resumable_identifier(started_at, &file_name),
            total_chunks: total_size.div_ceil(chunk_size.max(1)),
            file_name,
            total_size,
            chunk_size,
        }
    }

    /// Chunks in upload order; the last one holds the remainder
    pub fn chunks(&self) -> impl Iterator<Item = ChunkSpec> + '_ {
        (0..self.total_chunks).map(move |index| {
            let offset = index * self.chunk_size;
            ChunkSpec {
                number: index + 1,
                offset,
                len: self.chunk_size.min(self.total_size - offset),
            }
        })
    }

    /// Query parameters sent with one chunk
    ///
    /// `resumableChunkSize` repeats this chunk's own length rather than the
    /// configured chunk size; the upload service expects it that way.
    pub fn query_for(&self, chunk: &ChunkSpec) -> Vec<(&'static str, String)> {
        vec![
            ("resumableType", RESUMABLE_TYPE.to_string()),
            ("resumableChunkNumber", chunk.number.to_string()),
            ("resumableCurrentChunkSize", chunk.len.to_string()),
            ("resumableTotalSize", self.total_size.to_string()),
            ("resumableChunkSize", chunk.len.to_string()),
            ("resumableIdentifier", self.resumable_identifier.clone()),
            ("resumableFilename", self.file_name.clone()),
            ("resumableRelativePath", RESUMABLE_RELATIVE_PATH.to_string()),
            ("resumableTotalChunks", self.total_chunks.to_string()),
        ]
    }
}
