use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Receives everything the user should see: log view lines and notifications.
pub trait Notifier: Send + Sync {
    /// Appends a plain line to the log view.
    fn log_line(&self, line: &str);

    /// Shows a notification. `persistent` notifications stay until dismissed.
    fn notify(&self, severity: Severity, message: &str, persistent: bool);
}
