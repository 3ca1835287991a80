use async_trait::async_trait;
use futures_util::{FutureExt, Stream};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, warn};

use super::DownloadEvent;
use crate::error::{DupesError, Result};
use crate::queue::fully_decode;

/// Runs the external downloader once for one URL.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Name used in messages, usually the binary name.
    fn tool_name(&self) -> String;

    /// Invokes the tool as `<tool> <args...> <url>` and returns its output text.
    async fn exec(&self, url: &str, args: &[String]) -> Result<String>;
}

/// Launches a yt-dlp/youtube-dl compatible binary.
#[derive(Debug, Clone)]
pub struct YtDlpLauncher {
    binary: PathBuf,
}

impl YtDlpLauncher {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub async fn version(&self) -> Result<String> {
        Ok(run_tool(&self.binary, &["--version"]).await?.trim().to_string())
    }

    pub async fn list_extractors(&self) -> Result<Vec<String>> {
        let output = run_tool(&self.binary, &["--list-extractors"]).await?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl ProcessLauncher for YtDlpLauncher {
    fn tool_name(&self) -> String {
        tool_name_of(&self.binary)
    }

    async fn exec(&self, url: &str, args: &[String]) -> Result<String> {
        debug!("Running {:?} {:?} {}", self.binary, args, url);
        let output = command(&self.binary)
            .args(args)
            .arg(url)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DupesError::TaskSpawnFailure {
                tool: self.tool_name(),
                reason: e.to_string(),
            })?;
        collect_output(self.tool_name(), output)
    }
}

/// Runs any tool with the given arguments and returns its standard output.
pub async fn run_tool(binary: &Path, args: &[&str]) -> Result<String> {
    let tool = tool_name_of(binary);
    let output = command(binary)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| DupesError::TaskSpawnFailure {
            tool: tool.clone(),
            reason: e.to_string(),
        })?;
    collect_output(tool, output)
}

fn tool_name_of(binary: &Path) -> String {
    binary
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| binary.to_string_lossy().into_owned())
}

fn command(program: &Path) -> Command {
    let mut cmd = Command::new(program);
    configure_for_background(&mut cmd);
    cmd
}

#[cfg(windows)]
fn configure_for_background(cmd: &mut Command) {
    // Keep console windows from popping up for every download.
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn configure_for_background(_cmd: &mut Command) {}

fn collect_output(tool: String, output: std::process::Output) -> Result<String> {
    if !output.status.success() {
        return Err(DupesError::TaskExecutionFailure {
            tool,
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    String::from_utf8(output.stdout).map_err(|_| DupesError::MalformedOutput { tool })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded { output: String },
    Failed { error: String },
}

/// Final report for one URL of a batch.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub url: String,
    pub status: TaskStatus,
    pub duration: Duration,
}

impl TaskOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, TaskStatus::Succeeded { .. })
    }
}

/// Spawns one downloader process per URL.
#[derive(Clone)]
pub struct TaskRunner {
    launcher: Arc<dyn ProcessLauncher>,
    max_concurrent: Option<usize>,
    event_sender: Option<mpsc::UnboundedSender<DownloadEvent>>,
}

impl TaskRunner {
    /// Every task of a batch starts immediately.
    pub fn new(launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            launcher,
            max_concurrent: None,
            event_sender: None,
        }
    }

    /// Caps the number of processes running at the same time. `0` means no cap.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = (max_concurrent > 0).then_some(max_concurrent);
        self
    }

    pub fn with_events(mut self, sender: mpsc::UnboundedSender<DownloadEvent>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    pub fn tool_name(&self) -> String {
        self.launcher.tool_name()
    }

    /// Starts every URL without waiting for the others. Each task sends
    /// exactly one [`TaskOutcome`]; the channel closes after the last one.
    pub fn run_batch(
        &self,
        urls: Vec<String>,
        parameters: Arc<[String]>,
    ) -> mpsc::UnboundedReceiver<TaskOutcome> {
        let (outcome_sender, outcome_receiver) = mpsc::unbounded_channel();
        let semaphore = self.max_concurrent.map(|n| Arc::new(Semaphore::new(n)));

        for url in urls {
            let url = fully_decode(&url);
            let launcher = Arc::clone(&self.launcher);
            let parameters = Arc::clone(&parameters);
            let outcome_sender = outcome_sender.clone();
            let event_sender = self.event_sender.clone();
            let semaphore = semaphore.clone();

            tokio::spawn(async move {
                let _permit = match semaphore {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };

                if let Some(events) = &event_sender {
                    let _ = events.send(DownloadEvent::Started { url: url.clone() });
                }

                let start_time = Instant::now();
                let result = AssertUnwindSafe(launcher.exec(&url, &parameters))
                    .catch_unwind()
                    .await;
                let status = match result {
                    Ok(Ok(output)) => TaskStatus::Succeeded { output },
                    Ok(Err(e)) => {
                        if e.is_task_failure() {
                            warn!("Download of '{}' failed: {}", url, e);
                        } else {
                            error!("Download of '{}' failed unexpectedly: {}", url, e);
                        }
                        TaskStatus::Failed {
                            error: e.to_string(),
                        }
                    }
                    Err(_) => {
                        error!("Download task for '{}' panicked", url);
                        TaskStatus::Failed {
                            error: format!("{} task panicked", launcher.tool_name()),
                        }
                    }
                };

                let outcome = TaskOutcome {
                    url,
                    status,
                    duration: start_time.elapsed(),
                };
                if let Some(events) = &event_sender {
                    let _ = events.send(DownloadEvent::Finished {
                        url: outcome.url.clone(),
                        succeeded: outcome.succeeded(),
                    });
                }
                let _ = outcome_sender.send(outcome);
            });
        }

        outcome_receiver
    }

    /// [`TaskRunner::run_batch`] as a stream of outcomes.
    pub fn run_batch_stream(
        &self,
        urls: Vec<String>,
        parameters: Arc<[String]>,
    ) -> impl Stream<Item = TaskOutcome> + Send + 'static {
        let receiver = self.run_batch(urls, parameters);
        futures_util::stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|outcome| (outcome, receiver))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedLauncher {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ScriptedLauncher {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                running: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ProcessLauncher for ScriptedLauncher {
        fn tool_name(&self) -> String {
            "scripted".to_string()
        }

        async fn exec(&self, url: &str, args: &[String]) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), args.to_vec()));
            if url.contains("boom") {
                panic!("launcher blew up on {}", url);
            }
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);

            if url.contains("fail") {
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

    #[tokio::test]
    async fn test_one_outcome_per_url() {
        let launcher = Arc::new(ScriptedLauncher::new());
        let runner = TaskRunner::new(launcher.clone());
        let parameters: Arc<[String]> = vec!["--format".to_string(), "best".to_string()].into();

        let mut outcomes: Vec<TaskOutcome> = runner
            .run_batch_stream(
                vec![
                    "https://a.test/1".to_string(),
                    "https://a.test/fail".to_string(),
                    "https://a.test/3".to_string(),
                ],
                parameters,
            )
            .collect()
            .await;
        outcomes.sort_by(|a, b| a.url.cmp(&b.url));

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].succeeded());
        assert!(outcomes[1].succeeded());
        assert!(matches!(
            &outcomes[2].status,
            TaskStatus::Failed { error } if error.contains("Unsupported URL")
        ));

        let calls = launcher.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(_, args)| args == &["--format", "best"]));
    }

    #[tokio::test]
    async fn test_panicking_launch_still_reports() {
        let launcher = Arc::new(ScriptedLauncher::new());
        let runner = TaskRunner::new(launcher);

        let mut outcomes: Vec<TaskOutcome> = runner
            .run_batch_stream(
                vec!["https://a.test/1".to_string(), "https://a.test/boom".to_string()],
                Arc::from(Vec::new()),
            )
            .collect()
            .await;
        outcomes.sort_by(|a, b| a.url.cmp(&b.url));

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].succeeded());
        assert_eq!(outcomes[1].url, "https://a.test/boom");
        assert!(matches!(
            &outcomes[1].status,
            TaskStatus::Failed { error } if error == "scripted task panicked"
        ));
    }

    #[tokio::test]
    async fn test_urls_are_decoded_before_launch() {
        let launcher = Arc::new(ScriptedLauncher::new());
        let runner = TaskRunner::new(launcher.clone());

        let mut receiver = runner.run_batch(
            vec!["https%253A%252F%252Fa.test%252F1".to_string()],
            Arc::from(Vec::new()),
        );
        let outcome = receiver.recv().await.unwrap();
        assert_eq!(outcome.url, "https://a.test/1");
        assert!(receiver.recv().await.is_none());
        assert_eq!(launcher.calls.lock().unwrap()[0].0, "https://a.test/1");
    }

    #[tokio::test]
    async fn test_unbounded_runs_everything_at_once() {
        let launcher = Arc::new(ScriptedLauncher::new());
        let runner = TaskRunner::new(launcher.clone());
        let urls = (0..5).map(|i| format!("https://a.test/{}", i)).collect();

        let outcomes: Vec<_> = runner
            .run_batch_stream(urls, Arc::from(Vec::new()))
            .collect()
            .await;
        assert_eq!(outcomes.len(), 5);
        assert_eq!(launcher.peak.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_respected() {
        let launcher = Arc::new(ScriptedLauncher::new());
        let runner = TaskRunner::new(launcher.clone()).with_max_concurrent(2);
        let urls = (0..6).map(|i| format!("https://a.test/{}", i)).collect();

        let outcomes: Vec<_> = runner
            .run_batch_stream(urls, Arc::from(Vec::new()))
            .collect()
            .await;
        assert_eq!(outcomes.len(), 6);
        assert!(launcher.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_events_are_emitted() {
        let launcher = Arc::new(ScriptedLauncher::new());
        let (sender, mut events) = mpsc::unbounded_channel();
        let runner = TaskRunner::new(launcher).with_events(sender);

        let mut outcomes = runner.run_batch(
            vec!["https://a.test/fail".to_string()],
            Arc::from(Vec::new()),
        );
        outcomes.recv().await.unwrap();

        assert!(matches!(events.recv().await, Some(DownloadEvent::Started { .. })));
        assert!(matches!(
            events.recv().await,
            Some(DownloadEvent::Finished { succeeded: false, .. })
        ));
    }
}
