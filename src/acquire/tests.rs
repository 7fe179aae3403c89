use super::*;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::sync::mpsc;
use tempfile::tempdir;

/// Scripted transport: records every call, writes url-derived payloads,
/// and can fail any single phase.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FailAt {
    Nothing,
    Metadata,
    Cover,
    Audio,
}

struct FakeTransport {
    info: TrackInfo,
    fail: FailAt,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    fn new(title: &str, fail: FailAt) -> Self {
        Self {
            info: TrackInfo {
                title: title.to_string(),
                audio_url: "https://cdn.example/audio".to_string(),
                cover_url: "https://cdn.example/cover".to_string(),
            },
            fail,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transport for FakeTransport {
    fn track_info(&self, id: &str) -> Result<TrackInfo, FetchError> {
        self.calls.lock().unwrap().push(format!("info:{id}"));
        if self.fail == FailAt::Metadata {
            return Err(FetchError::Malformed("metadata service down".into()));
        }
        Ok(self.info.clone())
    }

    fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        self.calls.lock().unwrap().push(format!("get:{url}"));
        let failing = match self.fail {
            FailAt::Cover => url == self.info.cover_url,
            FailAt::Audio => url == self.info.audio_url,
            _ => false,
        };
        if failing {
            return Err(FetchError::Malformed("asset fetch refused".into()));
        }
        fs::write(dest, format!("payload:{url}")).unwrap();
        Ok(())
    }
}

fn run(transport: &FakeTransport, root: &Path, link: &str) -> (Result<String, AcquireError>, Vec<Progress>) {
    let (tx, rx) = mpsc::channel();
    let result = run_job(transport, root, link, &tx);
    drop(tx);
    (result, rx.into_iter().collect())
}

/// Non-hidden entries under the store root, i.e. what a scan could see.
fn visible_entries(root: &Path) -> Vec<String> {
    if !root.exists() {
        return Vec::new();
    }
    let mut names: Vec<String> = fs::read_dir(root)
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| !n.starts_with('.'))
        .collect();
    names.sort();
    names
}

#[test]
fn extracts_ids_from_known_link_shapes() {
    let cases = [
        ("https://www.youtube.com/watch?v=dQw4w9WgXcQ", "dQw4w9WgXcQ"),
        ("https://youtu.be/abc-123_X", "abc-123_X"),
        ("https://www.youtube.com/embed/xyz9?start=5", "xyz9"),
        ("https://www.youtube.com/v/QQQ1", "QQQ1"),
        ("https://host/watch?a=1&v=id42&t=3", "id42"),
        // Matching is case-insensitive but the id keeps its case.
        ("HTTPS://WWW.YOUTUBE.COM/WATCH?V=MixedCase", "MixedCase"),
    ];
    for (link, id) in cases {
        assert_eq!(extract_source_id(link).as_deref(), Some(id), "link: {link}");
    }
}

#[test]
fn extraction_rejects_links_without_an_id() {
    for link in [
        "",
        "https://example.com/nope",
        "not even a url",
        // Marker present but nothing follows it.
        "https://host/watch?v=",
    ] {
        assert_eq!(extract_source_id(link), None, "link: {link}");
    }
}

#[test]
fn track_info_decodes_the_service_body() {
    let info: TrackInfo = serde_json::from_str(
        r#"{ "title": "A Song", "audioUrl": "https://a/1.mp3", "coverUrl": "https://a/1.jpg" }"#,
    )
    .unwrap();
    assert_eq!(info.title, "A Song");
    assert_eq!(info.audio_url, "https://a/1.mp3");
    assert_eq!(info.cover_url, "https://a/1.jpg");

    assert!(serde_json::from_str::<TrackInfo>(r#"{ "title": "missing urls" }"#).is_err());
}

#[test]
fn invalid_source_fails_without_any_transport_call() {
    let dir = tempdir().unwrap();
    let transport = FakeTransport::new("Song", FailAt::Nothing);

    let (result, events) = run(&transport, dir.path(), "https://example.com/not-a-share-link");

    assert!(matches!(result, Err(AcquireError::InvalidSource)));
    assert_eq!(transport.call_count(), 0);
    assert!(events.is_empty());
}

#[test]
fn metadata_failure_leaves_the_filesystem_untouched() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("Songs");
    let transport = FakeTransport::new("Song", FailAt::Metadata);

    let (result, _) = run(&transport, &root, "https://youtu.be/abc");

    assert!(matches!(result, Err(AcquireError::Metadata(_))));
    assert!(!root.exists());
}

#[test]
fn audio_failure_discards_the_staged_cover_and_commits_nothing() {
    let dir = tempdir().unwrap();
    let transport = FakeTransport::new("Song", FailAt::Audio);

    let (result, _) = run(&transport, dir.path(), "https://youtu.be/abc");

    assert!(matches!(result, Err(AcquireError::AudioFetch(_))));
    // No track folder appeared, and staging was cleaned up: a concurrent
    // scan can never observe a cover-only folder from this job.
    assert!(visible_entries(dir.path()).is_empty());
    assert!(!dir.path().join(".staging").join("Song").exists());
}

#[test]
fn cover_failure_stops_before_the_audio_fetch() {
    let dir = tempdir().unwrap();
    let transport = FakeTransport::new("Song", FailAt::Cover);

    let (result, _) = run(&transport, dir.path(), "https://youtu.be/abc");

    assert!(matches!(result, Err(AcquireError::CoverFetch(_))));
    let calls = transport.calls.lock().unwrap();
    assert_eq!(calls.len(), 2, "metadata then cover, never audio: {calls:?}");
    assert!(visible_entries(dir.path()).is_empty());
}

#[test]
fn successful_job_commits_both_assets_and_reports_phases_in_order() {
    let dir = tempdir().unwrap();
    let transport = FakeTransport::new("My Song", FailAt::Nothing);

    let (result, events) = run(&transport, dir.path(), "https://youtu.be/abc");

    assert_eq!(result.unwrap(), "My Song");
    assert_eq!(visible_entries(dir.path()), vec!["My Song".to_string()]);

    let folder = dir.path().join("My Song");
    assert_eq!(
        fs::read(folder.join("My Song.jpg")).unwrap(),
        b"payload:https://cdn.example/cover"
    );
    assert_eq!(
        fs::read(folder.join("My Song.mp3")).unwrap(),
        b"payload:https://cdn.example/audio"
    );

    let phases: Vec<&str> = events
        .iter()
        .map(|p| match p {
            Progress::ResolvingMetadata => "metadata",
            Progress::FetchingCover { .. } => "cover",
            Progress::FetchingAudio { .. } => "audio",
            Progress::Saving { .. } => "saving",
            Progress::Completed { .. } => "completed",
            Progress::Failed { .. } => "failed",
        })
        .collect();
    assert_eq!(phases, vec!["metadata", "cover", "audio", "saving"]);
}

#[test]
fn titles_with_separators_are_sanitized_before_hitting_disk() {
    let dir = tempdir().unwrap();
    let transport = FakeTransport::new("AC/DC - Thunder", FailAt::Nothing);

    let (result, _) = run(&transport, dir.path(), "https://youtu.be/abc");

    assert_eq!(result.unwrap(), "AC-DC - Thunder");
    assert_eq!(visible_entries(dir.path()), vec!["AC-DC - Thunder".to_string()]);
}

#[test]
fn running_twice_overwrites_the_same_folder() {
    let dir = tempdir().unwrap();

    let first = FakeTransport::new("Song", FailAt::Nothing);
    run(&first, dir.path(), "https://youtu.be/abc").0.unwrap();

    // Same resolved title, different asset location.
    let mut second = FakeTransport::new("Song", FailAt::Nothing);
    second.info.audio_url = "https://cdn.example/audio-v2".to_string();
    run(&second, dir.path(), "https://youtu.be/abc").0.unwrap();

    assert_eq!(visible_entries(dir.path()), vec!["Song".to_string()]);
    assert_eq!(
        fs::read(dir.path().join("Song").join("Song.mp3")).unwrap(),
        b"payload:https://cdn.example/audio-v2"
    );
}

#[test]
fn acquirer_reports_terminal_events_from_the_worker() {
    let dir = tempdir().unwrap();
    let (tx, rx) = mpsc::channel();
    let acquirer = Acquirer::new(
        std::sync::Arc::new(FakeTransport::new("Song", FailAt::Nothing)),
        dir.path().to_path_buf(),
        tx,
    );

    acquirer.submit("https://youtu.be/abc".to_string());
    let terminal = rx
        .iter()
        .find(|p| matches!(p, Progress::Completed { .. } | Progress::Failed { .. }))
        .expect("worker must report a terminal event");
    match terminal {
        Progress::Completed { title } => assert_eq!(title, "Song"),
        other => panic!("expected Completed, got {other:?}"),
    }

    acquirer.submit("https://example.com/bad".to_string());
    let terminal = rx
        .iter()
        .find(|p| matches!(p, Progress::Completed { .. } | Progress::Failed { .. }))
        .unwrap();
    assert!(matches!(
        terminal,
        Progress::Failed {
            error: AcquireError::InvalidSource
        }
    ));
}
