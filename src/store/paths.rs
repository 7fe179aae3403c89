use std::env;
use std::path::{Path, PathBuf};

use crate::config::StoreSettings;

/// Extensions recognized as a track's audio asset (lowercase, no dot).
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a"];
/// Extensions recognized as a track's cover asset (lowercase, no dot).
pub const COVER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Folder under the data directory that holds the per-track folders.
pub const SONGS_DIR: &str = "Songs";
/// Dot-prefixed (and therefore never scanned) staging area for in-flight
/// downloads. Lives under the songs root so commit renames stay on one
/// filesystem.
pub(crate) const STAGING_DIR: &str = ".staging";

/// Make a raw title safe to use as a folder and file name.
///
/// Only path separators are replaced; other characters pass through
/// unchanged.
pub fn sanitize_title(raw: &str) -> String {
    raw.replace('/', "-")
}

fn has_extension_in(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| *e == ext)
        })
        .unwrap_or(false)
}

pub fn is_audio_file(path: &Path) -> bool {
    has_extension_in(path, AUDIO_EXTENSIONS)
}

pub fn is_cover_file(path: &Path) -> bool {
    has_extension_in(path, COVER_EXTENSIONS)
}

pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Resolve the songs root. Precedence (highest wins): the `store.root`
/// setting, `VIVACE_DATA_DIR`, `$XDG_DATA_HOME/vivace`, then
/// `~/.local/share/vivace`. Returns `None` only when no home directory can
/// be determined at all.
pub fn resolve_songs_root(settings: &StoreSettings) -> Option<PathBuf> {
    if let Some(root) = &settings.root {
        return Some(root.join(SONGS_DIR));
    }
    if let Some(p) = env::var_os("VIVACE_DATA_DIR") {
        return Some(PathBuf::from(p).join(SONGS_DIR));
    }

    let data_home = if let Some(xdg) = env::var_os("XDG_DATA_HOME") {
        Some(PathBuf::from(xdg))
    } else if let Some(home) = env::var_os("HOME") {
        Some(PathBuf::from(home).join(".local").join("share"))
    } else {
        None
    };

    data_home.map(|d| d.join("vivace").join(SONGS_DIR))
}

/// Staging directory for a single acquisition job.
pub(crate) fn staging_dir(songs_root: &Path, title: &str) -> PathBuf {
    songs_root.join(STAGING_DIR).join(title)
}
