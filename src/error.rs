use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DupesError {
    #[error("invalid url: '{0}'")]
    InvalidUrl(String),

    #[error("url is already part of the queue: {0}")]
    DuplicateUrl(String),

    #[error("unexpected download mode: '{0}' (expected 'audio' or 'video')")]
    InvalidMode(String),

    #[error("unsupported audio format: '{0}'")]
    InvalidAudioFormat(String),

    #[error("download directory does not exist: {}", .0.display())]
    DirectoryUnavailable(PathBuf),

    #[error("download directory is not writeable: {}", .0.display())]
    DirectoryNotWriteable(PathBuf),

    #[error("failed to start {tool}: {reason}")]
    TaskSpawnFailure { tool: String, reason: String },

    #[error("{tool} failed (code={code:?}) {stderr}")]
    TaskExecutionFailure {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} produced output that is not valid UTF-8")]
    MalformedOutput { tool: String },

    #[error("unexpected queue state: {0}")]
    UnexpectedQueueState(String),

    #[error("the download queue is empty")]
    EmptyQueue,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DupesError {
    /// Errors that only concern a single download task and never abort a batch.
    pub fn is_task_failure(&self) -> bool {
        matches!(
            self,
            DupesError::TaskSpawnFailure { .. }
                | DupesError::TaskExecutionFailure { .. }
                | DupesError::MalformedOutput { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DupesError>;
