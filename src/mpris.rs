//! MPRIS bridge: the external transport surface and the published
//! now-playing record.
//!
//! The engine writes the record through `NowPlayingHandle` inside each of
//! its transitions; the D-Bus interfaces read it, and inbound remote
//! commands are validated against the shared playback state so rejection
//! reaches the remote caller.

use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::block_on;
use tracing::warn;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::library::Track;
use crate::player::{PlaybackHandle, PlaybackStatus};

const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";
const MPRIS_NAME: &str = "org.mpris.MediaPlayer2.vivace";

/// Commands arriving from the session bus.
#[derive(Clone, Debug)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

/// The published now-playing record. Cleared wholesale on stop and on end
/// of queue.
#[derive(Debug, Default)]
pub(crate) struct SharedState {
    pub(crate) playback: PlaybackStatus,
    pub(crate) title: Option<String>,
    pub(crate) url: Option<String>,
    pub(crate) art_url: Option<String>,
    pub(crate) length_micros: Option<i64>,
    pub(crate) track_id: Option<OwnedObjectPath>,
}

/// Writer half handed to the playback engine.
#[derive(Clone)]
pub struct NowPlayingHandle {
    pub(crate) state: Arc<Mutex<SharedState>>,
    pub(crate) notify: Sender<()>,
}

impl NowPlayingHandle {
    /// Create a handle plus the receiver the bus thread listens on for
    /// `PropertiesChanged` emission.
    pub fn new() -> (Self, Receiver<()>) {
        let (notify, notify_rx) = channel();
        (
            Self {
                state: Arc::new(Mutex::new(SharedState::default())),
                notify,
            },
            notify_rx,
        )
    }

    /// Publish the record for `track`. Artwork is included only when the
    /// cover file is actually present; its absence is not an error.
    pub fn publish(&self, track: &Track, queue_pos: Option<usize>, playback: PlaybackStatus) {
        if let Ok(mut s) = self.state.lock() {
            s.playback = playback;
            s.title = Some(track.title.clone());
            s.url = Some(file_url(&track.audio_path));
            s.art_url = track.cover_path.exists().then(|| file_url(&track.cover_path));
            s.length_micros = track.duration.map(|d| d.as_micros() as i64);
            s.track_id = queue_pos.and_then(track_object_path);
        }
        let _ = self.notify.send(());
    }

    /// Remove the record entirely.
    pub fn clear(&self) {
        if let Ok(mut s) = self.state.lock() {
            *s = SharedState::default();
        }
        let _ = self.notify.send(());
    }
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

fn track_object_path(index: usize) -> Option<OwnedObjectPath> {
    ObjectPath::try_from(format!("{MPRIS_PATH}/track/{index}"))
        .ok()
        .map(Into::into)
}

pub(crate) struct RootIface {
    pub(crate) tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // Headless player; nothing to raise.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "vivace"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec![]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

pub(crate) struct PlayerIface {
    pub(crate) tx: Sender<ControlCmd>,
    pub(crate) state: Arc<Mutex<SharedState>>,
    pub(crate) playback: PlaybackHandle,
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    /// Remote play maps onto resume: accepted only when a track is loaded
    /// and not already playing.
    fn play(&self) -> zbus::fdo::Result<()> {
        let accepted = self
            .playback
            .lock()
            .map(|info| info.track.is_some() && !info.is_playing())
            .unwrap_or(false);
        if !accepted {
            return Err(zbus::fdo::Error::Failed("no paused track to play".into()));
        }
        let _ = self.tx.send(ControlCmd::Play);
        Ok(())
    }

    /// Remote pause: accepted only while playing.
    fn pause(&self) -> zbus::fdo::Result<()> {
        let accepted = self
            .playback
            .lock()
            .map(|info| info.is_playing())
            .unwrap_or(false);
        if !accepted {
            return Err(zbus::fdo::Error::Failed("nothing is playing".into()));
        }
        let _ = self.tx.send(ControlCmd::Pause);
        Ok(())
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            PlaybackStatus::Idle => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.playback
            .lock()
            .map(|info| info.elapsed.as_micros() as i64)
            .unwrap_or(0)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        if let Some(track_id) = &s.track_id {
            insert_value(&mut map, "mpris:trackid", Value::ObjectPath(track_id.clone().into_inner()));
        }
        if let Some(title) = &s.title {
            insert_value(&mut map, "xesam:title", Value::from(title.clone()));
        }
        if let Some(url) = &s.url {
            insert_value(&mut map, "xesam:url", Value::from(url.clone()));
        }
        if let Some(art_url) = &s.art_url {
            insert_value(&mut map, "mpris:artUrl", Value::from(art_url.clone()));
        }
        if let Some(length) = s.length_micros {
            insert_value(&mut map, "mpris:length", Value::from(length));
        }
        map
    }
}

fn insert_value(map: &mut HashMap<String, OwnedValue>, key: &str, value: Value<'_>) {
    if let Ok(value) = OwnedValue::try_from(value) {
        map.insert(key.to_string(), value);
    }
}

/// Register the MPRIS service on the session bus and keep it in sync with
/// the now-playing record. Bus failures only disable remote control; the
/// player keeps working.
pub fn spawn_mpris(
    tx: Sender<ControlCmd>,
    playback: PlaybackHandle,
    now_playing: &NowPlayingHandle,
    notify_rx: Receiver<()>,
) {
    let state = now_playing.state.clone();

    std::thread::spawn(move || {
        block_on(async move {
            let connection = match Connection::session().await {
                Ok(c) => c,
                Err(e) => {
                    warn!("MPRIS: failed to connect to session bus: {e}");
                    return;
                }
            };

            if let Err(e) = connection.request_name(MPRIS_NAME).await {
                warn!("MPRIS: failed to acquire name: {e}");
                return;
            }

            let object_server = connection.object_server();

            if let Err(e) = object_server.at(MPRIS_PATH, RootIface { tx: tx.clone() }).await {
                warn!("MPRIS: failed to register root iface: {e}");
                return;
            }

            if let Err(e) = object_server
                .at(MPRIS_PATH, PlayerIface { tx, state, playback })
                .await
            {
                warn!("MPRIS: failed to register player iface: {e}");
                return;
            }

            let iface_ref = match object_server.interface::<_, PlayerIface>(MPRIS_PATH).await {
                Ok(r) => r,
                Err(e) => {
                    warn!("MPRIS: failed to look up player iface: {e}");
                    return;
                }
            };

            // Emit PropertiesChanged whenever the engine publishes.
            loop {
                match notify_rx.recv_timeout(Duration::from_millis(500)) {
                    Ok(()) => {
                        let iface = iface_ref.get().await;
                        let emitter = iface_ref.signal_emitter();
                        let _ = iface.metadata_changed(emitter).await;
                        let _ = iface.playback_status_changed(emitter).await;
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });
    });
}
