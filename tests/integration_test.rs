use anyhow::Result;
use async_trait::async_trait;
use media_dupes::{
    BatchOutcome, ConfigManager, DirectoryValidator, DownloadManager, DownloadMode,
    DownloadSettings, DupesError, EntryStatus, JsonQueueStore, Notifier, ProcessLauncher,
    QueueStore, Severity, TaskRunner, YtDlpLauncher,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Succeeds unless the URL mentions "broken".
#[derive(Default)]
struct FakeDownloader {
    calls: AtomicUsize,
}

#[async_trait]
impl ProcessLauncher for FakeDownloader {
    fn tool_name(&self) -> String {
        "fake-dl".to_string()
    }

    async fn exec(&self, url: &str, _args: &[String]) -> media_dupes::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        if url.contains("broken") {
            Err(DupesError::TaskExecutionFailure {
                tool: self.tool_name(),
                code: Some(1),
                stderr: "ERROR: Unsupported URL".to_string(),
            })
        } else {
            Ok(format!("[download] {} has already been downloaded", url))
        }
    }
}

struct FixedDirectories {
    available: bool,
    writeable: bool,
}

impl DirectoryValidator for FixedDirectories {
    fn is_available(&self, _path: &Path) -> bool {
        self.available
    }

    fn is_writeable(&self, _path: &Path) -> bool {
        self.writeable
    }
}

#[derive(Default)]
struct RecordingNotifier {
    lines: Mutex<Vec<String>>,
    notifications: Mutex<Vec<(Severity, String, bool)>>,
}

impl RecordingNotifier {
    fn notifications(&self) -> Vec<(Severity, String, bool)> {
        self.notifications.lock().unwrap().clone()
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn log_line(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }

    fn notify(&self, severity: Severity, message: &str, persistent: bool) {
        self.notifications
            .lock()
            .unwrap()
            .push((severity, message.to_string(), persistent));
    }
}

fn manager_with(
    downloader: Arc<FakeDownloader>,
    writeable: bool,
) -> (DownloadManager, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let manager = DownloadManager::new(
        TaskRunner::new(downloader),
        Arc::new(FixedDirectories {
            available: true,
            writeable,
        }),
        notifier.clone(),
    );
    (manager, notifier)
}

#[tokio::test]
async fn test_partial_failure_finalizes_once() -> Result<()> {
    let downloader = Arc::new(FakeDownloader::default());
    let (mut manager, notifier) = manager_with(downloader.clone(), true);

    manager.add_url("https://vimeo.com/315670384")?;
    manager.add_url("https://example.com/broken")?;

    let settings = DownloadSettings::new("/data/media");
    let summary = manager.download_named("audio", &settings).await?;

    assert_eq!(downloader.calls.load(Ordering::SeqCst), 2);
    assert_eq!(summary.outcome, BatchOutcome::PartialFailure);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failed_urls, vec!["https://example.com/broken".to_string()]);
    assert_eq!(
        summary.message(),
        "Finished entire download queue (2) - 1 succeeded and 1 failed with errors."
    );

    let finals: Vec<_> = notifier
        .notifications()
        .into_iter()
        .filter(|(_, message, _)| message.starts_with("Finished entire download queue"))
        .collect();
    assert_eq!(finals.len(), 1);
    assert_eq!(finals[0].0, Severity::Warning);
    assert!(finals[0].2);

    assert!(manager.is_queue_empty());
    assert!(manager.batch().is_none());
    assert!(manager.controls().can_add);
    Ok(())
}

#[tokio::test]
async fn test_all_succeeded_and_all_failed() -> Result<()> {
    let (mut manager, notifier) = manager_with(Arc::new(FakeDownloader::default()), true);
    for i in 0..5 {
        manager.add_url(&format!("https://example.com/watch?v={}", i))?;
    }
    let summary = manager
        .download_batch(DownloadMode::Video, &DownloadSettings::new("/data/media"))
        .await?;
    assert_eq!(summary.outcome, BatchOutcome::AllSucceeded);
    assert_eq!(summary.message(), "Finished entire download queue (5) successfully");
    let progress = notifier
        .notifications()
        .iter()
        .filter(|(_, message, _)| message == "Finished 1 download")
        .count();
    assert_eq!(progress, 5);

    for i in 0..3 {
        manager.add_url(&format!("https://example.com/broken/{}", i))?;
    }
    let summary = manager
        .download_batch(DownloadMode::Audio, &DownloadSettings::new("/data/media"))
        .await?;
    assert_eq!(summary.outcome, BatchOutcome::AllFailed);
    assert_eq!(summary.severity(), Severity::Error);
    assert_eq!(
        summary.message(),
        "Finished entire download queue (3) - but all downloads failed with errors."
    );
    Ok(())
}

#[tokio::test]
async fn test_single_url_has_no_progress_notification() -> Result<()> {
    let (mut manager, notifier) = manager_with(Arc::new(FakeDownloader::default()), true);
    manager.add_url("https://vimeo.com/315670384")?;
    manager
        .download_batch(DownloadMode::Audio, &DownloadSettings::new("/data/media"))
        .await?;

    assert!(
        notifier
            .notifications()
            .iter()
            .all(|(_, message, _)| message != "Finished 1 download")
    );
    assert!(notifier.lines().contains(&"### QUEUE STARTED ###".to_string()));
    assert!(
        notifier
            .lines()
            .contains(&"Finished downloading: https://vimeo.com/315670384".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_invalid_url_is_rejected() {
    let (mut manager, notifier) = manager_with(Arc::new(FakeDownloader::default()), true);

    let result = manager.add_url("not a url");
    assert!(matches!(result, Err(DupesError::InvalidUrl(_))));
    assert!(manager.is_queue_empty());

    let notifications = notifier.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].0, Severity::Warning);
    assert!(notifications[0].1.starts_with("Please insert a valid url"));
}

#[tokio::test]
async fn test_unwriteable_directory_spawns_nothing() {
    let downloader = Arc::new(FakeDownloader::default());
    let (mut manager, notifier) = manager_with(downloader.clone(), false);
    tokio_test::assert_ok!(manager.add_url("https://vimeo.com/315670384"));

    let result = manager
        .download_batch(DownloadMode::Audio, &DownloadSettings::new("/read-only"))
        .await;

    assert!(matches!(result, Err(DupesError::DirectoryNotWriteable(_))));
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 0);

    let errors: Vec<_> = notifier
        .notifications()
        .into_iter()
        .filter(|(severity, _, _)| *severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].2);

    // the queue is untouched and can be started again later
    assert_eq!(manager.queue_len(), 1);
    assert_eq!(manager.snapshot()[0].status, EntryStatus::Pending);
    assert!(manager.batch().is_none());
}

#[tokio::test]
async fn test_queue_survives_restart() -> Result<()> {
    let dir = TempDir::new()?;
    let store = JsonQueueStore::new(dir.path().join("queue.json"));

    let (mut manager, _) = manager_with(Arc::new(FakeDownloader::default()), true);
    manager.add_url("https://www.youtube.com/playlist?list=PL0123")?;
    manager.add_url("https://example.com/watch%253Fv%253D42")?;
    manager.persist_to(&store)?;

    let (mut restored, notifier) = manager_with(Arc::new(FakeDownloader::default()), true);
    assert_eq!(restored.restore_from(&store)?, 2);
    assert_eq!(
        restored.snapshot().iter().map(|e| e.url.as_str()).collect::<Vec<_>>(),
        vec![
            "https://www.youtube.com/playlist?list=PL0123",
            "https://example.com/watch?v=42"
        ]
    );
    assert!(
        notifier
            .notifications()
            .iter()
            .any(|(_, message, _)| message == "Restored 2 URLs from your last session.")
    );

    // a finished batch leaves nothing behind
    restored
        .download_batch(DownloadMode::Audio, &DownloadSettings::new("/data/media"))
        .await?;
    restored.persist_to(&store)?;
    assert!(!store.path().exists());
    assert!(store.load()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_restore_keeps_urls_outside_the_url_grammar() -> Result<()> {
    let dir = TempDir::new()?;
    let store = JsonQueueStore::new(dir.path().join("queue.json"));

    let (mut manager, _) = manager_with(Arc::new(FakeDownloader::default()), true);
    manager.add_url("https://a.test/caf%C3%A9")?;
    manager.add_url("https://a.test/a%20b")?;
    manager.add_url("https://a.test/x%2Cy")?;
    manager.persist_to(&store)?;

    let (mut restored, notifier) = manager_with(Arc::new(FakeDownloader::default()), true);
    assert_eq!(restored.restore_from(&store)?, 3);
    assert_eq!(
        restored.snapshot().iter().map(|e| e.url.as_str()).collect::<Vec<_>>(),
        vec!["https://a.test/café", "https://a.test/a b", "https://a.test/x,y"]
    );
    assert!(
        notifier
            .notifications()
            .iter()
            .any(|(severity, message, _)| *severity == Severity::Success
                && message == "Restored 3 URLs from your last session.")
    );
    Ok(())
}

#[tokio::test]
async fn test_unrestorable_entries_are_reported() -> Result<()> {
    let dir = TempDir::new()?;
    let store = JsonQueueStore::new(dir.path().join("queue.json"));
    store.save(&[
        "https://a.test/1".to_string(),
        "https://a.test/1".to_string(),
        "   ".to_string(),
    ])?;

    let (mut manager, notifier) = manager_with(Arc::new(FakeDownloader::default()), true);
    assert_eq!(manager.restore_from(&store)?, 1);

    let warnings: Vec<_> = notifier
        .notifications()
        .into_iter()
        .filter(|(severity, _, _)| *severity == Severity::Warning)
        .collect();
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].1.starts_with("Could not restore 'https://a.test/1'"));
    Ok(())
}

#[tokio::test]
async fn test_config_drives_settings() -> Result<()> {
    let dir = TempDir::new()?;
    let media = dir.path().join("media");
    std::fs::create_dir_all(&media)?;

    let mut config_manager = ConfigManager::with_config_file(dir.path().join("config.toml"))?;
    config_manager.set_value("general.download_dir", &media.to_string_lossy())?;
    config_manager.set_value("general.audio_format", "flac")?;
    config_manager.set_value("general.additional_parameters", "--limit-rate 1M")?;
    config_manager.set_value("general.enable_additional_parameters", "true")?;
    config_manager.save()?;

    let reloaded = ConfigManager::with_config_file(dir.path().join("config.toml"))?;
    let settings = reloaded.config().download_settings();
    assert_eq!(settings.download_dir, media);

    let args = media_dupes::ParameterBuilder::build(DownloadMode::Audio, &settings);
    let format_at = args.iter().position(|a| a == "--audio-format").unwrap();
    assert_eq!(args[format_at + 1], "flac");
    assert!(!args.contains(&"--embed-thumbnail".to_string()));
    assert_eq!(&args[args.len() - 2..], ["--limit-rate", "1M"]);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_real_process_outcomes() {
    let shell = YtDlpLauncher::new("/bin/sh");

    // the URL lands in $0 of the script
    let args = vec!["-c".to_string(), "echo got $0".to_string()];
    let output = shell.exec("https://vimeo.com/1", &args).await.unwrap();
    assert_eq!(output.trim(), "got https://vimeo.com/1");

    let args = vec!["-c".to_string(), "echo nope >&2; exit 3".to_string()];
    match shell.exec("https://vimeo.com/1", &args).await {
        Err(DupesError::TaskExecutionFailure { code, stderr, .. }) => {
            assert_eq!(code, Some(3));
            assert!(stderr.contains("nope"));
        }
        other => panic!("expected execution failure, got {:?}", other),
    }

    let missing = YtDlpLauncher::new("/nonexistent/yt-dlp");
    let result = missing.exec("https://vimeo.com/1", &[]).await;
    assert!(matches!(result, Err(DupesError::TaskSpawnFailure { .. })));
}
