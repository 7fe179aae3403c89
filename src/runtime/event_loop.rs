use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::info;

use crate::acquire::{Acquirer, Progress};
use crate::library::{self, Track};
use crate::mpris::ControlCmd;
use crate::player::{PlaybackStatus, Player, PlayerEvent};

/// Line commands accepted on stdin.
enum Command {
    List,
    Play(usize),
    Pause,
    Resume,
    Stop,
    Seek(u64),
    Next,
    Prev,
    Add(String),
    Rescan,
    Quit,
    Help,
}

/// Main event loop: stdin drives the cadence, and the control, acquisition
/// and player channels are drained opportunistically on every pass.
/// Returns when the user quits or stdin closes.
pub fn run(
    songs_root: PathBuf,
    mut tracks: Vec<Track>,
    player: &Player,
    acquirer: &Acquirer,
    control_rx: Receiver<ControlCmd>,
    acquire_rx: Receiver<Progress>,
    player_events_rx: Receiver<PlayerEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    let lines_rx = spawn_stdin_reader();

    print_library(&tracks);
    println!("commands: list, play N, pause, resume, stop, seek SECS, next, prev, add LINK, rescan, quit");

    'outer: loop {
        match lines_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(line) => {
                if handle_line(&line, &songs_root, &mut tracks, player, acquirer) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control(cmd, &tracks, player) {
                break 'outer;
            }
        }

        while let Ok(progress) = acquire_rx.try_recv() {
            println!("{}", describe_progress(&progress));
            if matches!(progress, Progress::Completed { .. }) {
                // Library changed: adopt the new list. The engine's queue
                // snapshot is deliberately left alone.
                match library::scan(&songs_root) {
                    Ok(rescanned) => {
                        tracks = rescanned;
                        println!("library now holds {} track(s)", tracks.len());
                    }
                    Err(e) => eprintln!("rescan failed: {e}"),
                }
            }
        }

        while let Ok(event) = player_events_rx.try_recv() {
            match event {
                PlayerEvent::TrackFinished { track } => {
                    info!(title = %track.title, "track finished");
                }
                PlayerEvent::LoadFailed { track, error } => {
                    eprintln!("cannot play \"{}\": {error}", track.title);
                }
            }
        }
    }

    player.shutdown();
    Ok(())
}

/// Returns `true` when the loop should exit.
fn handle_line(
    line: &str,
    songs_root: &std::path::Path,
    tracks: &mut Vec<Track>,
    player: &Player,
    acquirer: &Acquirer,
) -> bool {
    let Some(command) = parse_command(line) else {
        if !line.trim().is_empty() {
            eprintln!("unrecognized command: {}", line.trim());
        }
        return false;
    };

    match command {
        Command::Quit => return true,
        Command::Help => {
            println!("commands: list, play N, pause, resume, stop, seek SECS, next, prev, add LINK, rescan, quit");
        }
        Command::List => print_library(tracks),
        Command::Rescan => match library::scan(songs_root) {
            Ok(rescanned) => {
                *tracks = rescanned;
                print_library(tracks);
            }
            Err(e) => eprintln!("scan failed: {e}"),
        },
        Command::Play(n) => match tracks.get(n.wrapping_sub(1)) {
            Some(track) => player.play(track.clone(), Some(tracks.to_vec())),
            None => eprintln!("no track #{n}; see `list`"),
        },
        Command::Pause => player.pause(),
        Command::Resume => player.resume(),
        Command::Stop => player.stop(),
        Command::Seek(secs) => player.seek_to(Duration::from_secs(secs)),
        Command::Next => player.next(),
        Command::Prev => player.previous(),
        Command::Add(link) => acquirer.submit(link),
    }
    false
}

fn handle_control(cmd: ControlCmd, tracks: &[Track], player: &Player) -> bool {
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => player.resume(),
        ControlCmd::Pause => player.pause(),
        ControlCmd::PlayPause => {
            let snapshot = player.snapshot();
            match snapshot.status {
                PlaybackStatus::Playing => player.pause(),
                PlaybackStatus::Paused => player.resume(),
                PlaybackStatus::Idle => {
                    if let Some(first) = tracks.first() {
                        player.play(first.clone(), Some(tracks.to_vec()));
                    }
                }
            }
        }
        ControlCmd::Stop => player.stop(),
        ControlCmd::Next => player.next(),
        ControlCmd::Prev => player.previous(),
    }
    false
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.trim().splitn(2, char::is_whitespace);
    let word = parts.next()?;
    let rest = parts.next().map(str::trim).unwrap_or("");

    match word {
        "list" | "ls" => Some(Command::List),
        "play" => rest.parse().ok().map(Command::Play),
        "pause" => Some(Command::Pause),
        "resume" => Some(Command::Resume),
        "stop" => Some(Command::Stop),
        "seek" => rest.parse().ok().map(Command::Seek),
        "next" => Some(Command::Next),
        "prev" | "previous" => Some(Command::Prev),
        "add" if !rest.is_empty() => Some(Command::Add(rest.to_string())),
        "rescan" => Some(Command::Rescan),
        "quit" | "exit" | "q" => Some(Command::Quit),
        "help" => Some(Command::Help),
        _ => None,
    }
}

fn print_library(tracks: &[Track]) {
    if tracks.is_empty() {
        println!("library is empty; `add LINK` downloads a track");
        return;
    }
    for (i, track) in tracks.iter().enumerate() {
        match track.duration {
            Some(d) => println!("{:3}  {}  [{}:{:02}]", i + 1, track.title, d.as_secs() / 60, d.as_secs() % 60),
            None => println!("{:3}  {}", i + 1, track.title),
        }
    }
}

pub(super) fn describe_progress(progress: &Progress) -> String {
    match progress {
        Progress::ResolvingMetadata => "fetching metadata...".to_string(),
        Progress::FetchingCover { title } => format!("downloading cover for \"{title}\"..."),
        Progress::FetchingAudio { title } => format!("downloading audio for \"{title}\"..."),
        Progress::Saving { title } => format!("saving \"{title}\"..."),
        Progress::Completed { title } => format!("\"{title}\" downloaded"),
        Progress::Failed { error } => format!("download failed: {error}"),
    }
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
