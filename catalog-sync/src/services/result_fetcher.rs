//! Bulk result file download
//!
//! The result file is streamed into a [`ScratchFile`] that removes itself
//! when dropped, whichever way the run ends.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::error::SyncError;

const SCRATCH_PREFIX: &str = "bulk-products-";
const SCRATCH_SUFFIX: &str = ".jsonl";
const CONNECT_TIMEOUT_SECS: u64 = 30;
/// Longest wait for the response head or the next body chunk
const IDLE_TIMEOUT_SECS: u64 = 120;

/// Uniquely named scratch file, deleted on drop
#[derive(Debug)]
pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    pub fn create_in(dir: &Path) -> Result<Self, SyncError> {
        let file = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .suffix(SCRATCH_SUFFIX)
            .tempfile_in(dir)?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn path_buf(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Async handle for writing the file contents
    pub fn writer(&self) -> Result<File, SyncError> {
        Ok(File::from_std(self.file.as_file().try_clone()?))
    }

    /// Fresh buffered reader positioned at the start of the file
    pub async fn open(&self) -> Result<BufReader<File>, SyncError> {
        let file = File::open(self.path()).await?;
        Ok(BufReader::new(file))
    }
}

/// Downloads a completed job's result file
#[async_trait]
pub trait ResultDownloader: Send + Sync {
    async fn download(&self, url: &str, scratch_dir: &Path) -> Result<ScratchFile, SyncError>;
}

/// reqwest-backed downloader
///
/// The result URL is pre-signed; no credentials are sent. There is no cap
/// on total transfer time, only on how long the stream may stall.
pub struct HttpDownloader {
    http_client: reqwest::Client,
    idle_timeout: Duration,
}

impl HttpDownloader {
    pub fn new() -> Result<Self, SyncError> {
        Self::with_idle_timeout(Duration::from_secs(IDLE_TIMEOUT_SECS))
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Result<Self, SyncError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| SyncError::Fetch(e.to_string()))?;

        Ok(Self {
            http_client,
            idle_timeout,
        })
    }

    fn stalled(&self) -> SyncError {
        SyncError::Fetch(format!(
            "result download stalled for more than {}s",
            self.idle_timeout.as_secs_f64()
        ))
    }
}

#[async_trait]
impl ResultDownloader for HttpDownloader {
    async fn download(&self, url: &str, scratch_dir: &Path) -> Result<ScratchFile, SyncError> {
        let mut response = tokio::time::timeout(self.idle_timeout, self.http_client.get(url).send())
            .await
            .map_err(|_| self.stalled())?
            .map_err(|e| SyncError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Fetch(format!(
                "result file request returned HTTP {}",
                status
            )));
        }

        let scratch = ScratchFile::create_in(scratch_dir)?;
        let mut writer = scratch.writer()?;
        let mut bytes_written: u64 = 0;

        while let Some(chunk) = tokio::time::timeout(self.idle_timeout, response.chunk())
            .await
            .map_err(|_| self.stalled())?
            .map_err(|e| SyncError::Fetch(e.to_string()))?
        {
            writer.write_all(&chunk).await?;
            bytes_written += chunk.len() as u64;
        }
        writer.flush().await?;

        debug!(path = %scratch.path().display(), "Result file written");
        info!(bytes = bytes_written, "Bulk result file downloaded");

        Ok(scratch)
    }
}
