pub mod manager;
pub mod params;
pub mod runner;
pub mod tracker;

pub use manager::{BatchRun, ControlState, DownloadManager};
pub use params::{AudioFormat, DownloadMode, DownloadSettings, ParameterBuilder};
pub use runner::{ProcessLauncher, TaskOutcome, TaskRunner, TaskStatus, YtDlpLauncher, run_tool};
pub use tracker::{BatchOutcome, BatchSummary, BatchTracker, TrackerState};

/// Per-task lifecycle notifications, sent when a runner has an event channel.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    Started { url: String },
    Finished { url: String, succeeded: bool },
}
