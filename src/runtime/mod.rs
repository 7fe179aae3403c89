use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use tracing::warn;

use crate::acquire::{Acquirer, HttpTransport, Progress};
use crate::config::Settings;
use crate::library;
use crate::mpris::{self, ControlCmd, NowPlayingHandle};
use crate::player::{AudioOutput, Player, RodioOutput};
use crate::store;

mod event_loop;
mod settings;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();

    let Some(songs_root) = store::resolve_songs_root(&settings.store) else {
        return Err("cannot determine a data directory (set VIVACE_DATA_DIR or HOME)".into());
    };

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("add") => {
            let link = args.next().ok_or("usage: vivace add <link>")?;
            run_once(&settings, &songs_root, &link)
        }
        Some(other) => Err(format!("unknown command: {other} (try `vivace` or `vivace add <link>`)").into()),
        None => interactive(&settings, songs_root),
    }
}

/// `vivace add <link>`: run a single acquisition to completion and exit.
fn run_once(settings: &Settings, songs_root: &Path, link: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (acquirer, events) = make_acquirer(settings, songs_root.to_path_buf())?;

    acquirer.submit(link.to_string());
    for event in events {
        match event {
            Progress::Completed { title } => {
                println!("\"{title}\" downloaded");
                return Ok(());
            }
            Progress::Failed { error } => return Err(error.to_string().into()),
            phase => println!("{}", event_loop::describe_progress(&phase)),
        }
    }
    Err("acquisition worker exited without reporting a result".into())
}

/// Interactive mode: scan the store, register MPRIS, and hand control to
/// the line-command event loop.
fn interactive(settings: &Settings, songs_root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let tracks = match library::scan(&songs_root) {
        Ok(tracks) => tracks,
        Err(e) => {
            // A failed scan is not an empty library; say so, then start
            // with nothing rather than refusing to run.
            eprintln!("vivace: library scan failed: {e}");
            warn!(error = %e, "library scan failed at startup");
            Vec::new()
        }
    };

    let (now_playing, notify_rx) = NowPlayingHandle::new();
    let (player_events_tx, player_events_rx) = mpsc::channel();
    let player = Player::new(now_playing.clone(), player_events_tx, || {
        RodioOutput::open().map(|output| Box::new(output) as Box<dyn AudioOutput>)
    });

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    mpris::spawn_mpris(control_tx, player.playback_handle(), &now_playing, notify_rx);

    let (acquirer, acquire_rx) = make_acquirer(settings, songs_root.clone())?;

    event_loop::run(
        songs_root,
        tracks,
        &player,
        &acquirer,
        control_rx,
        acquire_rx,
        player_events_rx,
    )
}

fn make_acquirer(
    settings: &Settings,
    songs_root: PathBuf,
) -> Result<(Acquirer, mpsc::Receiver<Progress>), Box<dyn std::error::Error>> {
    let transport = HttpTransport::new(
        settings.service.info_url.clone(),
        Duration::from_secs(settings.service.request_timeout_secs),
    )?;
    let (events_tx, events_rx) = mpsc::channel();
    Ok((
        Acquirer::new(Arc::new(transport), songs_root, events_tx),
        events_rx,
    ))
}
