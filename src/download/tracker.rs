use chrono::{DateTime, Local};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::DownloadMode;
use crate::error::{DupesError, Result};
use crate::notify::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    AllSucceeded,
    PartialFailure,
    AllFailed,
}

impl BatchOutcome {
    /// Classifies final counts. `None` while tasks are still outstanding.
    pub fn classify(total: usize, succeeded: usize, failed: usize) -> Option<Self> {
        if total == 0 || succeeded + failed != total {
            return None;
        }
        Some(if failed == 0 {
            BatchOutcome::AllSucceeded
        } else if succeeded == 0 {
            BatchOutcome::AllFailed
        } else {
            BatchOutcome::PartialFailure
        })
    }

    pub fn severity(&self) -> Severity {
        match self {
            BatchOutcome::AllSucceeded => Severity::Success,
            BatchOutcome::PartialFailure => Severity::Warning,
            BatchOutcome::AllFailed => Severity::Error,
        }
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOutcome::AllSucceeded => write!(f, "all succeeded"),
            BatchOutcome::PartialFailure => write!(f, "partial failure"),
            BatchOutcome::AllFailed => write!(f, "all failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Collecting,
    Complete(BatchOutcome),
}

#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub mode: DownloadMode,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcome: BatchOutcome,
    pub failed_urls: Vec<String>,
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn message(&self) -> String {
        match self.outcome {
            BatchOutcome::AllSucceeded => format!(
                "Finished entire download queue ({}) successfully",
                self.total
            ),
            BatchOutcome::PartialFailure => format!(
                "Finished entire download queue ({}) - {} succeeded and {} failed with errors.",
                self.total, self.succeeded, self.failed
            ),
            BatchOutcome::AllFailed => format!(
                "Finished entire download queue ({}) - but all downloads failed with errors.",
                self.total
            ),
        }
    }

    pub fn severity(&self) -> Severity {
        self.outcome.severity()
    }
}

/// Counts task outcomes for one batch and finalizes it exactly once.
///
/// The tracker is not shared: the orchestrator owns it and feeds it from a
/// single channel consumer, which serializes every increment and check.
#[derive(Debug)]
pub struct BatchTracker {
    batch_id: Uuid,
    mode: DownloadMode,
    total: usize,
    succeeded: usize,
    failed: usize,
    failed_urls: Vec<String>,
    started_at: DateTime<Local>,
    state: TrackerState,
}

impl BatchTracker {
    pub fn new(batch_id: Uuid, mode: DownloadMode, total: usize) -> Self {
        Self {
            batch_id,
            mode,
            total,
            succeeded: 0,
            failed: 0,
            failed_urls: Vec::new(),
            started_at: Local::now(),
            state: TrackerState::Collecting,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn finished(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, TrackerState::Complete(_))
    }

    /// Records one finished task. Returns the summary on the transition to
    /// `Complete` and `None` otherwise.
    pub fn record(&mut self, url: &str, succeeded: bool) -> Result<Option<BatchSummary>> {
        if self.is_complete() || self.finished() >= self.total {
            warn!(
                "Batch {} received an outcome for '{}' after all {} tasks finished",
                self.batch_id, url, self.total
            );
            return Err(DupesError::UnexpectedQueueState(format!(
                "received more outcomes than the {} queued urls",
                self.total
            )));
        }

        if succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
            self.failed_urls.push(url.to_string());
        }

        debug!(
            "Batch {}: overall {}, succeeded {}, failed {}",
            self.batch_id, self.total, self.succeeded, self.failed
        );

        let Some(outcome) = BatchOutcome::classify(self.total, self.succeeded, self.failed) else {
            return Ok(None);
        };

        self.state = TrackerState::Complete(outcome);
        info!("Batch {} finished: {}", self.batch_id, outcome);

        let elapsed = (Local::now() - self.started_at)
            .to_std()
            .unwrap_or_default();
        Ok(Some(BatchSummary {
            batch_id: self.batch_id,
            mode: self.mode,
            total: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            outcome,
            failed_urls: self.failed_urls.clone(),
            started_at: self.started_at,
            elapsed,
        }))
    }
}
