use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use tracing::{info, warn};

use crate::store::{self, StagedAssets};

use super::extract::extract_source_id;
use super::fetch::Transport;
use super::types::{AcquireError, Progress, TrackInfo};

/// Run one acquisition job to completion, reporting phase transitions on
/// `events`. Returns the sanitized title on success.
///
/// Phases run in strict order. Assets land in a staging directory that the
/// scanner never sees; the final commit is the only mutation of the
/// visible store, so a failure at any phase leaves the library untouched.
pub fn run_job(
    transport: &dyn Transport,
    songs_root: &Path,
    link: &str,
    events: &Sender<Progress>,
) -> Result<String, AcquireError> {
    let id = extract_source_id(link).ok_or(AcquireError::InvalidSource)?;

    let _ = events.send(Progress::ResolvingMetadata);
    let info = transport
        .track_info(&id)
        .map_err(|e| AcquireError::Metadata(e.to_string()))?;

    let title = store::sanitize_title(&info.title);
    let staged = StagedAssets::prepare(songs_root, &title)
        .map_err(|e| AcquireError::Save(e.to_string()))?;

    let outcome = fetch_and_commit(transport, songs_root, &title, &info, &staged, events);
    staged.discard();

    outcome.map(|()| {
        info!(title = %title, "track acquired");
        title
    })
}

fn fetch_and_commit(
    transport: &dyn Transport,
    songs_root: &Path,
    title: &str,
    info: &TrackInfo,
    staged: &StagedAssets,
    events: &Sender<Progress>,
) -> Result<(), AcquireError> {
    let _ = events.send(Progress::FetchingCover {
        title: title.to_string(),
    });
    transport
        .download(&info.cover_url, &staged.cover)
        .map_err(|e| AcquireError::CoverFetch(e.to_string()))?;

    // Audio strictly after the cover; both must be staged before anything
    // becomes visible.
    let _ = events.send(Progress::FetchingAudio {
        title: title.to_string(),
    });
    transport
        .download(&info.audio_url, &staged.audio)
        .map_err(|e| AcquireError::AudioFetch(e.to_string()))?;

    let _ = events.send(Progress::Saving {
        title: title.to_string(),
    });
    store::commit_track(songs_root, title, staged)
        .map_err(|e| AcquireError::Save(e.to_string()))?;

    Ok(())
}

/// Runs acquisition jobs on detached worker threads and reports their
/// progress on a shared event channel.
pub struct Acquirer {
    transport: Arc<dyn Transport>,
    songs_root: PathBuf,
    events: Sender<Progress>,
}

impl Acquirer {
    pub fn new(transport: Arc<dyn Transport>, songs_root: PathBuf, events: Sender<Progress>) -> Self {
        Self {
            transport,
            songs_root,
            events,
        }
    }

    /// Submit a link for download. Jobs are independent: submitting again
    /// while one is in flight affects neither job.
    pub fn submit(&self, link: String) {
        let transport = self.transport.clone();
        let songs_root = self.songs_root.clone();
        let events = self.events.clone();

        thread::spawn(move || {
            match run_job(transport.as_ref(), &songs_root, &link, &events) {
                Ok(title) => {
                    let _ = events.send(Progress::Completed { title });
                }
                Err(error) => {
                    warn!(link = %link, error = %error, "acquisition failed");
                    let _ = events.send(Progress::Failed { error });
                }
            }
        });
    }
}
