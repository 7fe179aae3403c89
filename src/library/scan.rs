use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::prelude::*;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::store::{is_audio_file, is_cover_file, is_hidden};

use super::model::Track;

/// A scan that could not run at all. Distinct from an empty library, which
/// is a successful scan with no tracks.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to create store root {path}: {source}")]
    CreateRoot { path: PathBuf, source: io::Error },
    #[error("failed to enumerate store root {path}: {source}")]
    Enumerate { path: PathBuf, source: walkdir::Error },
}

/// Scan the songs root and rebuild the track list from scratch.
///
/// The root is created when absent. Each immediate subdirectory holding
/// both a recognized audio file and a recognized cover file yields one
/// `Track` titled after the folder; folders missing either asset are
/// skipped silently. The result is sorted by title so playlist order does
/// not depend on filesystem enumeration order.
pub fn scan(songs_root: &Path) -> Result<Vec<Track>, ScanError> {
    fs::create_dir_all(songs_root).map_err(|source| ScanError::CreateRoot {
        path: songs_root.to_path_buf(),
        source,
    })?;

    let mut tracks: Vec<Track> = Vec::new();
    for entry in WalkDir::new(songs_root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| ScanError::Enumerate {
            path: songs_root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_dir() || is_hidden(entry.path()) {
            continue;
        }
        if let Some(track) = read_track_folder(entry.path()) {
            tracks.push(track);
        }
    }

    tracks.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
    Ok(tracks)
}

/// Classify a track folder's direct children into audio and cover
/// candidates. When several files match a category the last one
/// enumerated wins. Returns `None` when either category is empty.
fn read_track_folder(folder: &Path) -> Option<Track> {
    let mut audio: Option<PathBuf> = None;
    let mut cover: Option<PathBuf> = None;

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !entry.file_type().is_file() || is_hidden(path) {
            continue;
        }
        if is_audio_file(path) {
            audio = Some(path.to_path_buf());
        } else if is_cover_file(path) {
            cover = Some(path.to_path_buf());
        }
    }

    let title = folder.file_name()?.to_str()?.to_string();
    match (audio, cover) {
        (Some(audio_path), Some(cover_path)) => Some(Track {
            duration: read_duration(&audio_path),
            title,
            audio_path,
            cover_path,
        }),
        _ => {
            debug!(folder = %folder.display(), "folder missing audio or cover, skipped");
            None
        }
    }
}

fn read_duration(path: &Path) -> Option<Duration> {
    lofty::read_from_path(path)
        .ok()
        .map(|tagged| tagged.properties().duration())
}
