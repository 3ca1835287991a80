use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{
    BatchSummary, BatchTracker, DownloadMode, DownloadSettings, ParameterBuilder, TaskRunner,
    TaskStatus,
};
use crate::directory::DirectoryValidator;
use crate::error::{DupesError, Result};
use crate::notify::{Notifier, Severity};
use crate::queue::{AddedUrl, EntryStatus, QueueEntry, QueueStore, UrlQueue};

/// What the front-end may enable, derived from queue and batch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub can_add: bool,
    pub can_start: bool,
    pub others_enabled: bool,
    pub busy: bool,
}

/// A batch that has been started and not yet finalized.
#[derive(Debug)]
pub struct BatchRun {
    pub id: Uuid,
    pub mode: DownloadMode,
    pub parameters: Arc<[String]>,
    tracker: BatchTracker,
}

/// Owns the URL queue and the running batch. Created once per session and
/// handed to whatever drives it; nothing else mutates queue or counters.
pub struct DownloadManager {
    queue: UrlQueue,
    batch: Option<BatchRun>,
    runner: TaskRunner,
    directories: Arc<dyn DirectoryValidator>,
    notifier: Arc<dyn Notifier>,
}

impl DownloadManager {
    pub fn new(
        runner: TaskRunner,
        directories: Arc<dyn DirectoryValidator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            queue: UrlQueue::new(),
            batch: None,
            runner,
            directories,
            notifier,
        }
    }

    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.queue.snapshot()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_queue_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn batch(&self) -> Option<&BatchRun> {
        self.batch.as_ref()
    }

    pub fn controls(&self) -> ControlState {
        let busy = self.batch.is_some();
        ControlState {
            can_add: !busy,
            can_start: !busy && !self.queue.is_empty(),
            others_enabled: !busy,
            busy,
        }
    }

    pub fn add_url(&mut self, raw_url: &str) -> Result<AddedUrl> {
        match self.queue.add(raw_url) {
            Ok(added) => {
                if added.possible_playlist {
                    self.notifier.log_line(&format!(
                        "Added {} to the todo list (might be a playlist)",
                        added.url
                    ));
                } else {
                    self.notifier
                        .log_line(&format!("Added {} to the todo list", added.url));
                }
                Ok(added)
            }
            Err(DupesError::InvalidUrl(url)) => {
                let reason = if url.is_empty() {
                    "was empty"
                } else {
                    "unable to detect a valid url"
                };
                self.notifier.notify(
                    Severity::Warning,
                    &format!("Please insert a valid url (reason: {})", reason),
                    false,
                );
                Err(DupesError::InvalidUrl(url))
            }
            Err(DupesError::DuplicateUrl(url)) => {
                self.notifier.notify(
                    Severity::Warning,
                    &format!("{} is already part of the current todo list", url),
                    false,
                );
                Err(DupesError::DuplicateUrl(url))
            }
            Err(e) => Err(e),
        }
    }

    pub fn remove_url(&mut self, url: &str) -> bool {
        let removed = self.queue.remove(url);
        if removed {
            self.notifier
                .log_line(&format!("Removed {} from the todo list", url.trim()));
        }
        removed
    }

    /// Empties the queue and forgets any batch state.
    pub fn reset(&mut self) {
        if let Some(batch) = self.batch.take() {
            info!("Dropping state of batch {} on reset", batch.id);
        }
        self.queue.clear();
        debug!("Queue reset");
    }

    /// Re-inserts the URLs saved by [`DownloadManager::persist_to`].
    /// Entries that cannot be restored are reported as warnings.
    pub fn restore_from(&mut self, store: &dyn QueueStore) -> Result<usize> {
        let mut restored = 0;
        for url in store.load()? {
            match self.queue.restore(&url) {
                Ok(_) => restored += 1,
                Err(e) => {
                    warn!("Skipping stored url '{}': {}", url, e);
                    self.notifier.notify(
                        Severity::Warning,
                        &format!(
                            "Could not restore '{}' from your last session: {}",
                            url, e
                        ),
                        false,
                    );
                }
            }
        }

        if restored > 0 {
            info!("Restored {} urls from the previous session", restored);
            self.notifier.notify(
                Severity::Success,
                &format!("Restored {} URLs from your last session.", restored),
                false,
            );
        }
        Ok(restored)
    }

    pub fn persist_to(&self, store: &dyn QueueStore) -> Result<()> {
        store.save(&self.queue.urls())
    }

    /// [`DownloadManager::download_batch`] with the mode given by name.
    pub async fn download_named(
        &mut self,
        mode: &str,
        settings: &DownloadSettings,
    ) -> Result<BatchSummary> {
        let mode = match mode.parse::<DownloadMode>() {
            Ok(mode) => mode,
            Err(e) => return Err(self.abort_start(e)),
        };
        self.download_batch(mode, settings).await
    }

    /// Downloads every queued URL and waits for all of them. Preconditions
    /// are checked before any process starts; single task failures only
    /// count against the batch.
    pub async fn download_batch(
        &mut self,
        mode: DownloadMode,
        settings: &DownloadSettings,
    ) -> Result<BatchSummary> {
        if let Some(batch) = &self.batch {
            let e = DupesError::UnexpectedQueueState(format!(
                "batch {} is still running",
                batch.id
            ));
            return Err(self.abort_start(e));
        }

        let dir = &settings.download_dir;
        if !self.directories.is_available(dir) {
            return Err(self.abort_start(DupesError::DirectoryUnavailable(dir.clone())));
        }
        if !self.directories.is_writeable(dir) {
            return Err(self.abort_start(DupesError::DirectoryNotWriteable(dir.clone())));
        }

        if self.queue.is_empty() {
            return Err(self.abort_start(DupesError::EmptyQueue));
        }
        if !self.queue.all_have_status(EntryStatus::Pending) {
            let e = DupesError::UnexpectedQueueState(
                "queue contains entries that are not pending".to_string(),
            );
            return Err(self.abort_start(e));
        }

        let parameters: Arc<[String]> = ParameterBuilder::build(mode, settings).into();
        let urls = self.queue.urls();
        let batch_id = Uuid::new_v4();
        info!(
            "Starting batch {} ({}) with {} urls using {}",
            batch_id,
            mode,
            urls.len(),
            self.runner.tool_name()
        );
        debug!("Parameters: {:?}", parameters);

        self.log_batch_header(mode, settings, &urls);
        self.queue.set_all_status(EntryStatus::Running);
        self.batch = Some(BatchRun {
            id: batch_id,
            mode,
            parameters: Arc::clone(&parameters),
            tracker: BatchTracker::new(batch_id, mode, urls.len()),
        });

        let total = urls.len();
        let mut outcomes = self.runner.run_batch(urls, parameters);

        while let Some(outcome) = outcomes.recv().await {
            let succeeded = outcome.succeeded();
            match &outcome.status {
                TaskStatus::Succeeded { output } => {
                    self.queue.set_status(&outcome.url, EntryStatus::Succeeded);
                    if !output.trim().is_empty() {
                        self.notifier.log_line(output.trim_end());
                    }
                    self.notifier
                        .log_line(&format!("Finished downloading: {}", outcome.url));
                    if total > 1 {
                        self.notifier
                            .notify(Severity::Success, "Finished 1 download", false);
                    }
                }
                TaskStatus::Failed { error } => {
                    self.queue.set_status(&outcome.url, EntryStatus::Failed);
                    self.notifier.log_line(&format!("Failed to download: {}", outcome.url));
                    self.notifier.notify(
                        Severity::Error,
                        &format!("Download failed: {}\n{}", outcome.url, error),
                        true,
                    );
                }
            }

            let recorded = match self.batch.as_mut() {
                Some(batch) => batch.tracker.record(&outcome.url, succeeded),
                None => Err(DupesError::UnexpectedQueueState(
                    "batch state disappeared while downloads were running".to_string(),
                )),
            };

            match recorded {
                Ok(Some(summary)) => {
                    self.finish_batch(&summary);
                    return Ok(summary);
                }
                Ok(None) => {}
                Err(e) => {
                    self.abandon_batch();
                    return Err(self.report(e));
                }
            }
        }

        self.abandon_batch();
        Err(self.report(DupesError::UnexpectedQueueState(
            "download tasks ended without reporting every url".to_string(),
        )))
    }

    fn log_batch_header(&self, mode: DownloadMode, settings: &DownloadSettings, urls: &[String]) {
        self.notifier.log_line("");
        self.notifier.log_line("### QUEUE STARTED ###");
        self.notifier.log_line(&format!("Download mode:\t{}", mode));
        if mode == DownloadMode::Audio {
            self.notifier
                .log_line(&format!("Audio-Format:\t{}", settings.audio_format));
        }
        self.notifier
            .log_line(&format!("Verbose mode:\t{}", settings.verbose));
        let extra = settings.extra_flags();
        if !extra.is_empty() {
            self.notifier
                .log_line(&format!("Added parameters:\t{}", extra.join(" ")));
        }
        for url in urls {
            if crate::queue::is_possible_playlist(url) {
                self.notifier
                    .log_line(&format!("Added: \t\t{} to queue (might be a playlist)", url));
            } else {
                self.notifier.log_line(&format!("Added: \t\t{} to queue", url));
            }
        }
    }

    fn finish_batch(&mut self, summary: &BatchSummary) {
        let message = summary.message();
        self.notifier.notify(summary.severity(), &message, true);
        self.notifier.log_line(&message);
        self.queue.clear();
        self.batch = None;
    }

    /// Drops an unfinished batch and hands its entries back as pending, so
    /// the queue can be started again.
    fn abandon_batch(&mut self) {
        if let Some(batch) = self.batch.take() {
            debug!("Abandoning batch {}", batch.id);
        }
        self.queue.set_all_status(EntryStatus::Pending);
    }

    /// Reports a failure that prevents the batch from starting.
    fn abort_start(&self, e: DupesError) -> DupesError {
        let message = match &e {
            DupesError::InvalidMode(_) => {
                format!("{}. Please report this issue", e)
            }
            DupesError::DirectoryUnavailable(_) | DupesError::DirectoryNotWriteable(_) => {
                format!("Aborted download: {}", e)
            }
            DupesError::UnexpectedQueueState(_) => format!("{}. Please report this", e),
            _ => e.to_string(),
        };
        error!("Unable to start batch: {}", e);
        self.notifier.notify(Severity::Error, &message, true);
        e
    }

    fn report(&self, e: DupesError) -> DupesError {
        error!("Batch aborted: {}", e);
        self.notifier
            .notify(Severity::Error, &format!("{}. Please report this", e), true);
        e
    }
}
