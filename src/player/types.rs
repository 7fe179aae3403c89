use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::library::Track;

use super::output::LoadError;

#[derive(Debug)]
pub enum PlayerCmd {
    /// Start `track` from the beginning, optionally replacing the autoplay
    /// queue. Restarts even when the track is already the current one.
    Play {
        track: Track,
        queue: Option<Vec<Track>>,
    },
    /// Pause; only honored while playing.
    Pause,
    /// Resume a loaded track; only honored while not playing.
    Resume,
    /// Release the sink and return to `Idle`.
    Stop,
    /// Seek to an absolute position, clamped to the track duration.
    SeekTo(Duration),
    /// Step forward in the queue; no-op past the end.
    Next,
    /// Step back in the queue; no-op at the start.
    Prev,
    /// Shut the engine thread down.
    Quit,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
    Paused,
}

/// Runtime playback information shared with the runtime and the
/// now-playing bridge. `status != Idle` implies `track` is set.
#[derive(Debug, Clone, Default)]
pub struct PlaybackInfo {
    pub track: Option<Track>,
    pub status: PlaybackStatus,
    pub elapsed: Duration,
    pub duration: Option<Duration>,
    /// Index of the current track within the autoplay queue, when it is
    /// part of it.
    pub queue_pos: Option<usize>,
}

impl PlaybackInfo {
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;

/// Events the engine thread reports to its owner.
#[derive(Debug)]
pub enum PlayerEvent {
    /// The current track played to its natural end. Fired exactly once per
    /// finished track and never on an explicit stop.
    TrackFinished { track: Track },
    /// Loading a track's audio failed; the engine is back in `Idle`.
    LoadFailed { track: Track, error: LoadError },
}
