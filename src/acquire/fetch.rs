use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use super::types::TrackInfo;

/// Transport used by the pipeline: metadata resolution plus raw asset
/// download. Production uses HTTP; tests substitute a fake to drive
/// failures and to assert that rejected links never hit the network.
pub trait Transport: Send + Sync {
    fn track_info(&self, id: &str) -> Result<TrackInfo, FetchError>;
    fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed metadata response: {0}")]
    Malformed(String),
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Blocking HTTP transport against the configured metadata service.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    info_url: String,
}

impl HttpTransport {
    /// `info_url` is the metadata endpoint queried as `<info_url>?id=<id>`;
    /// `timeout` bounds every request, so a stalled phase surfaces as that
    /// phase's error instead of hanging the job.
    pub fn new(info_url: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client, info_url })
    }
}

impl Transport for HttpTransport {
    fn track_info(&self, id: &str) -> Result<TrackInfo, FetchError> {
        let url = format!("{}?id={}", self.info_url, id);
        debug!(url = %url, "resolving track metadata");

        let response = self.client.get(&url).send()?.error_for_status()?;
        response
            .json::<TrackInfo>()
            .map_err(|e| FetchError::Malformed(e.to_string()))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        debug!(url = %url, dest = %dest.display(), "downloading asset");

        let mut response = self.client.get(url).send()?.error_for_status()?;
        let mut file = File::create(dest).map_err(|source| FetchError::Write {
            path: dest.to_path_buf(),
            source,
        })?;
        response.copy_to(&mut file)?;
        Ok(())
    }
}
