use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::library::Track;
use crate::mpris::NowPlayingHandle;

use super::output::{AudioOutput, LoadError};
use super::thread::spawn_player_thread;
use super::types::{PlaybackHandle, PlaybackInfo, PlayerCmd, PlayerEvent};

/// Public handle to the playback engine. All operations are forwarded to
/// the engine thread, which applies them in submission order.
pub struct Player {
    tx: Sender<PlayerCmd>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Player {
    /// Spawn the engine. `output_factory` runs on the engine thread, so the
    /// audio device (and any blocking decode work later) never touches the
    /// caller's thread.
    pub fn new(
        now_playing: NowPlayingHandle,
        events: Sender<PlayerEvent>,
        output_factory: impl FnOnce() -> Result<Box<dyn AudioOutput>, LoadError> + Send + 'static,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<PlayerCmd>();
        let playback: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));

        let join = spawn_player_thread(rx, playback.clone(), now_playing, events, output_factory);

        Self {
            tx,
            playback,
            join: Mutex::new(Some(join)),
        }
    }

    pub fn playback_handle(&self) -> PlaybackHandle {
        self.playback.clone()
    }

    /// Snapshot of the current playback state.
    pub fn snapshot(&self) -> PlaybackInfo {
        self.playback
            .lock()
            .map(|info| info.clone())
            .unwrap_or_default()
    }

    /// Play `track` from the start; `queue` (when supplied) becomes the
    /// autoplay queue the engine walks on natural end-of-track.
    pub fn play(&self, track: Track, queue: Option<Vec<Track>>) {
        let _ = self.tx.send(PlayerCmd::Play { track, queue });
    }

    pub fn pause(&self) {
        let _ = self.tx.send(PlayerCmd::Pause);
    }

    pub fn resume(&self) {
        let _ = self.tx.send(PlayerCmd::Resume);
    }

    pub fn stop(&self) {
        let _ = self.tx.send(PlayerCmd::Stop);
    }

    pub fn seek_to(&self, to: Duration) {
        let _ = self.tx.send(PlayerCmd::SeekTo(to));
    }

    pub fn next(&self) {
        let _ = self.tx.send(PlayerCmd::Next);
    }

    pub fn previous(&self) {
        let _ = self.tx.send(PlayerCmd::Prev);
    }

    /// Stop playback and join the engine thread.
    pub fn shutdown(&self) {
        let _ = self.tx.send(PlayerCmd::Quit);
        if let Ok(mut join) = self.join.lock() {
            if let Some(handle) = join.take() {
                let _ = handle.join();
            }
        }
    }
}
