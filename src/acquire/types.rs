use serde::Deserialize;
use thiserror::Error;

/// Metadata returned by the `/info` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub title: String,
    pub audio_url: String,
    pub cover_url: String,
}

/// Terminal failure of an acquisition job, one variant per phase. Jobs are
/// never retried automatically; the caller resubmits from scratch.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("no recognizable track id in link")]
    InvalidSource,
    #[error("metadata lookup failed: {0}")]
    Metadata(String),
    #[error("cover download failed: {0}")]
    CoverFetch(String),
    #[error("audio download failed: {0}")]
    AudioFetch(String),
    #[error("saving track failed: {0}")]
    Save(String),
}

/// Progress reported by a running acquisition job. `Completed` and
/// `Failed` are terminal; `Completed` also tells the receiver the library
/// contents changed.
#[derive(Debug)]
pub enum Progress {
    ResolvingMetadata,
    FetchingCover { title: String },
    FetchingAudio { title: String },
    Saving { title: String },
    Completed { title: String },
    Failed { error: AcquireError },
}
