pub mod config;
pub mod directory;
pub mod download;
pub mod error;
pub mod notify;
pub mod queue;

// Re-export commonly used types for easier access in tests
pub use config::ConfigManager;
pub use directory::{DirectoryValidator, FsDirectoryValidator};
pub use download::{
    AudioFormat, BatchOutcome, BatchSummary, ControlState, DownloadManager, DownloadMode,
    DownloadSettings, ParameterBuilder, ProcessLauncher, TaskOutcome, TaskRunner, TaskStatus,
    YtDlpLauncher,
};
pub use error::{DupesError, Result};
pub use notify::{Notifier, Severity};
pub use queue::{EntryStatus, JsonQueueStore, QueueEntry, QueueStore, UrlQueue};
