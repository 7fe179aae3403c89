use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::paths::staging_dir;

/// Staged asset locations for one acquisition job, ready to commit.
#[derive(Debug)]
pub struct StagedAssets {
    pub dir: PathBuf,
    pub cover: PathBuf,
    pub audio: PathBuf,
}

impl StagedAssets {
    /// Create the staging directory for `title` and name the asset paths
    /// inside it. `title` must already be sanitized.
    pub fn prepare(songs_root: &Path, title: &str) -> io::Result<Self> {
        let dir = staging_dir(songs_root, title);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            cover: dir.join(format!("{title}.jpg")),
            audio: dir.join(format!("{title}.mp3")),
            dir,
        })
    }

    /// Best-effort removal of the staging directory and anything left in it.
    pub fn discard(&self) {
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(dir = %self.dir.display(), error = %e, "could not clean staging directory");
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("failed to create track folder {path}: {source}")]
    CreateFolder { path: PathBuf, source: io::Error },
    #[error("failed to place {path}: {source}")]
    Place { path: PathBuf, source: io::Error },
}

/// Move staged assets into `<songs_root>/<title>/`, replacing any files
/// already under those names.
///
/// The cover moves first and the audio file last: a folder holding only a
/// cover is not a valid store entry, so a scan racing this commit never
/// observes a half-written track.
pub fn commit_track(
    songs_root: &Path,
    title: &str,
    staged: &StagedAssets,
) -> Result<(), CommitError> {
    let folder = songs_root.join(title);
    fs::create_dir_all(&folder).map_err(|source| CommitError::CreateFolder {
        path: folder.clone(),
        source,
    })?;

    move_replacing(&staged.cover, &folder.join(format!("{title}.jpg")))?;
    move_replacing(&staged.audio, &folder.join(format!("{title}.mp3")))?;

    debug!(folder = %folder.display(), "committed track");
    Ok(())
}

fn move_replacing(from: &Path, to: &Path) -> Result<(), CommitError> {
    let place = |source| CommitError::Place {
        path: to.to_path_buf(),
        source,
    };

    // Remove a previous download under the same name, then rename. Staging
    // lives under the songs root, so the rename never crosses filesystems.
    match fs::remove_file(to) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(place(e)),
    }
    fs::rename(from, to).map_err(place)
}
