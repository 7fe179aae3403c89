use std::path::PathBuf;
use std::time::Duration;

/// One playable entry of the store: a titled folder holding an audio file
/// and a cover image. Only constructed by a scan, and only when both
/// assets exist; immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Folder name; doubles as the track's natural key.
    pub title: String,
    pub audio_path: PathBuf,
    pub cover_path: PathBuf,
    /// Duration read from the audio file's properties at scan time.
    /// `None` when the file could not be probed.
    pub duration: Option<Duration>,
}
