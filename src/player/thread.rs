use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::library::Track;
use crate::mpris::NowPlayingHandle;

use super::output::{AudioOutput, AudioSink, LoadError};
use super::types::{PlaybackHandle, PlaybackStatus, PlayerCmd, PlayerEvent};

/// Engine-thread state. All playback mutation happens through this one
/// owner, so transport operations can never interleave.
struct Engine {
    output: Result<Box<dyn AudioOutput>, String>,
    queue: Vec<Track>,
    queue_pos: Option<usize>,
    current: Option<Track>,
    sink: Option<Box<dyn AudioSink>>,
    paused: bool,
    playback: PlaybackHandle,
    now_playing: NowPlayingHandle,
    events: Sender<PlayerEvent>,
}

pub(super) fn spawn_player_thread(
    rx: Receiver<PlayerCmd>,
    playback: PlaybackHandle,
    now_playing: NowPlayingHandle,
    events: Sender<PlayerEvent>,
    output_factory: impl FnOnce() -> Result<Box<dyn AudioOutput>, LoadError> + Send + 'static,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let output = output_factory().map_err(|e| {
            error!(error = %e, "audio output unavailable, every load will fail");
            e.to_string()
        });

        // Ticker advancing the published elapsed time while playing.
        let ticker_playback = playback.clone();
        thread::spawn(move || {
            loop {
                thread::sleep(Duration::from_millis(500));
                let Ok(mut info) = ticker_playback.lock() else {
                    break;
                };
                if info.status == PlaybackStatus::Playing {
                    info.elapsed += Duration::from_millis(500);
                }
            }
        });

        let mut engine = Engine {
            output,
            queue: Vec::new(),
            queue_pos: None,
            current: None,
            sink: None,
            paused: true,
            playback,
            now_playing,
            events,
        };

        loop {
            match rx.recv_timeout(Duration::from_millis(200)) {
                Ok(PlayerCmd::Play { track, queue }) => engine.play(track, queue),
                Ok(PlayerCmd::Pause) => engine.pause(),
                Ok(PlayerCmd::Resume) => engine.resume(),
                Ok(PlayerCmd::Stop) => engine.stop(),
                Ok(PlayerCmd::SeekTo(to)) => engine.seek(to),
                Ok(PlayerCmd::Next) => engine.step(1),
                Ok(PlayerCmd::Prev) => engine.step(-1),
                Ok(PlayerCmd::Quit) => {
                    engine.stop();
                    break;
                }
                Err(RecvTimeoutError::Timeout) => engine.poll_end_of_track(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

impl Engine {
    /// Start `track` from position zero. A supplied queue replaces the
    /// autoplay queue wholesale; autoplay then walks that snapshot until
    /// the next `play` with a queue.
    fn play(&mut self, track: Track, queue: Option<Vec<Track>>) {
        if let Some(queue) = queue {
            self.queue = queue;
        }
        self.queue_pos = self.queue.iter().position(|t| t.title == track.title);

        // Unconditional restart, even when `track` is already playing.
        if let Some(old) = self.sink.take() {
            old.stop();
        }

        let output = match &self.output {
            Ok(output) => output,
            Err(msg) => {
                let msg = msg.clone();
                self.fail_load(track, LoadError::Device(msg));
                return;
            }
        };

        match output.load(&track, Duration::ZERO) {
            Ok(sink) => {
                sink.play();
                self.sink = Some(sink);
                self.paused = false;
                self.current = Some(track);
                self.publish(Duration::ZERO);
            }
            Err(error) => self.fail_load(track, error),
        }
    }

    fn pause(&mut self) {
        if self.paused || self.sink.is_none() {
            debug!("pause rejected: nothing is playing");
            return;
        }
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        self.paused = true;
        self.publish(self.elapsed());
    }

    fn resume(&mut self) {
        if self.sink.is_none() || !self.paused {
            debug!("resume rejected: no paused track");
            return;
        }
        if let Some(sink) = &self.sink {
            sink.play();
        }
        self.paused = false;
        self.publish(self.elapsed());
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.current = None;
        self.paused = true;
        self.publish(Duration::ZERO);
    }

    /// Seek to an absolute position by rebuilding the sink at the target.
    /// Clamped to the track duration; the play/pause state carries over.
    fn seek(&mut self, to: Duration) {
        let Some(track) = self.current.clone() else {
            debug!("seek rejected: no track loaded");
            return;
        };
        if self.sink.is_none() {
            return;
        }
        let Some(duration) = track.duration else {
            debug!(title = %track.title, "seek skipped: track duration unknown");
            return;
        };
        let target = to.min(duration);

        let Ok(output) = &self.output else { return };
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        match output.load(&track, target) {
            Ok(sink) => {
                if !self.paused {
                    sink.play();
                }
                self.sink = Some(sink);
                self.publish(target);
            }
            Err(error) => self.fail_load(track, error),
        }
    }

    /// Step within the queue. Out-of-bounds steps are no-ops; there is no
    /// wraparound.
    fn step(&mut self, delta: i64) {
        let Some(pos) = self.queue_pos else {
            debug!("next/prev ignored: current track is not queued");
            return;
        };
        let Some(new_pos) = pos.checked_add_signed(delta as isize) else {
            return;
        };
        if let Some(track) = self.queue.get(new_pos).cloned() {
            self.play(track, None);
        }
    }

    /// Called on the command-receive timeout: detect a naturally finished
    /// track and advance through the queue snapshot.
    fn poll_end_of_track(&mut self) {
        let finished = match &self.sink {
            Some(sink) => !self.paused && sink.is_finished(),
            None => false,
        };
        if !finished {
            return;
        }

        self.sink = None;
        let Some(track) = self.current.take() else {
            return;
        };
        let _ = self.events.send(PlayerEvent::TrackFinished {
            track: track.clone(),
        });

        match self.queue_pos.and_then(|p| self.queue.get(p + 1).cloned()) {
            Some(next) => self.play(next, None),
            None => self.stop(),
        }
    }

    fn fail_load(&mut self, track: Track, error: LoadError) {
        warn!(title = %track.title, error = %error, "failed to load track");
        self.stop();
        let _ = self.events.send(PlayerEvent::LoadFailed { track, error });
    }

    fn elapsed(&self) -> Duration {
        self.playback
            .lock()
            .map(|info| info.elapsed)
            .unwrap_or(Duration::ZERO)
    }

    /// Write the shared playback info and mirror it into the now-playing
    /// record before the transition returns.
    fn publish(&self, elapsed: Duration) {
        let status = if self.current.is_none() {
            PlaybackStatus::Idle
        } else if self.paused {
            PlaybackStatus::Paused
        } else {
            PlaybackStatus::Playing
        };

        if let Ok(mut info) = self.playback.lock() {
            info.track = self.current.clone();
            info.status = status;
            info.elapsed = elapsed;
            info.duration = self.current.as_ref().and_then(|t| t.duration);
            info.queue_pos = self.queue_pos;
        }

        match &self.current {
            Some(track) => self.now_playing.publish(track, self.queue_pos, status),
            None => self.now_playing.clear(),
        }
    }
}
