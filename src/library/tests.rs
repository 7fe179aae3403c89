use super::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn make_track_folder(root: &Path, name: &str, audio: Option<&str>, cover: Option<&str>) {
    let folder = root.join(name);
    fs::create_dir_all(&folder).unwrap();
    if let Some(audio) = audio {
        fs::write(folder.join(audio), b"not real audio").unwrap();
    }
    if let Some(cover) = cover {
        fs::write(folder.join(cover), b"not a real image").unwrap();
    }
}

#[test]
fn scan_creates_missing_root_and_returns_empty() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("Songs");

    let tracks = scan(&root).unwrap();
    assert!(tracks.is_empty());
    assert!(root.is_dir());
}

#[test]
fn scan_yields_one_track_per_complete_folder_titled_after_it() {
    let dir = tempdir().unwrap();
    make_track_folder(dir.path(), "First Song", Some("First Song.mp3"), Some("First Song.jpg"));
    make_track_folder(dir.path(), "Second", Some("audio.WAV"), Some("art.PNG"));

    let tracks = scan(dir.path()).unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].title, "First Song");
    assert!(tracks[0].audio_path.ends_with("First Song.mp3"));
    assert!(tracks[0].cover_path.ends_with("First Song.jpg"));
    assert_eq!(tracks[1].title, "Second");
    // Fake bytes cannot be probed for a duration.
    assert_eq!(tracks[1].duration, None);
}

#[test]
fn scan_silently_skips_folders_missing_either_asset() {
    let dir = tempdir().unwrap();
    make_track_folder(dir.path(), "audio only", Some("a.mp3"), None);
    make_track_folder(dir.path(), "cover only", None, Some("c.jpg"));
    make_track_folder(dir.path(), "empty", None, None);
    make_track_folder(dir.path(), "complete", Some("a.m4a"), Some("c.jpeg"));

    let tracks = scan(dir.path()).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].title, "complete");
}

#[test]
fn scan_ignores_hidden_folders_and_loose_files() {
    let dir = tempdir().unwrap();
    make_track_folder(dir.path(), ".staging", Some("a.mp3"), Some("c.jpg"));
    fs::write(dir.path().join("loose.mp3"), b"not real").unwrap();
    make_track_folder(dir.path(), "visible", Some("a.mp3"), Some("c.jpg"));

    let tracks = scan(dir.path()).unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].title, "visible");
}

#[test]
fn scan_sorts_by_title_case_insensitive() {
    let dir = tempdir().unwrap();
    for name in ["delta", "Alpha", "charlie", "Bravo"] {
        make_track_folder(dir.path(), name, Some("a.mp3"), Some("c.jpg"));
    }

    let titles: Vec<String> = scan(dir.path()).unwrap().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["Alpha", "Bravo", "charlie", "delta"]);
}

#[test]
fn scan_uses_a_single_candidate_per_category() {
    let dir = tempdir().unwrap();
    let folder = dir.path().join("двойной");
    fs::create_dir_all(&folder).unwrap();
    fs::write(folder.join("one.mp3"), b"x").unwrap();
    fs::write(folder.join("two.mp3"), b"y").unwrap();
    fs::write(folder.join("c.jpg"), b"z").unwrap();

    // Enumeration order is unspecified; either audio file may win, but the
    // folder still yields exactly one track.
    let tracks = scan(dir.path()).unwrap();
    assert_eq!(tracks.len(), 1);
    let audio = tracks[0].audio_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(audio == "one.mp3" || audio == "two.mp3");
}

#[test]
fn scan_error_is_distinct_from_empty_library() {
    let dir = tempdir().unwrap();
    // Occupy the root path with a file so the root cannot be created.
    let root = dir.path().join("Songs");
    fs::write(&root, b"in the way").unwrap();

    let err = scan(&root).unwrap_err();
    assert!(matches!(err, ScanError::CreateRoot { .. }));
}
