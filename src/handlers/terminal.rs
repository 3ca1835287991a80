use chrono::Local;
use console::{Term, style};
use indicatif::ProgressBar;
use media_dupes::{Notifier, Severity};
use std::sync::Mutex;

/// Prints log lines and notifications to the terminal. While a progress
/// bar is attached, output goes through it so the bar is redrawn below.
pub struct ConsoleNotifier {
    term: Term,
    verbose: bool,
    progress: Mutex<Option<ProgressBar>>,
}

impl ConsoleNotifier {
    pub fn new(verbose: bool) -> Self {
        Self {
            term: Term::stdout(),
            verbose,
            progress: Mutex::new(None),
        }
    }

    pub fn attach_progress(&self, bar: ProgressBar) {
        if let Ok(mut progress) = self.progress.lock() {
            *progress = Some(bar);
        }
    }

    pub fn detach_progress(&self) -> Option<ProgressBar> {
        self.progress.lock().ok().and_then(|mut progress| progress.take())
    }

    fn write(&self, line: &str) {
        let progress = self.progress.lock().ok().and_then(|p| p.clone());
        match progress {
            Some(bar) => bar.println(line),
            None => {
                // stdout going away is not worth failing a download over
                let _ = self.term.write_line(line);
            }
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn log_line(&self, line: &str) {
        if !self.verbose {
            return;
        }
        let stamp = Local::now().format("%H:%M:%S").to_string();
        for part in line.lines() {
            self.write(&format!("{} {}", style(&stamp).dim(), part));
        }
    }

    fn notify(&self, severity: Severity, message: &str, persistent: bool) {
        let icon = match severity {
            Severity::Info => {
                if !self.verbose {
                    return;
                }
                style("ℹ️").blue()
            }
            Severity::Success => style("✅").green(),
            Severity::Warning => style("⚠️").yellow(),
            Severity::Error => style("❌").red(),
        };

        let mut lines = message.lines();
        let first = lines.next().unwrap_or_default();
        let first = if persistent {
            style(first).bold().to_string()
        } else {
            first.to_string()
        };
        self.write(&format!("{} {}", icon, first));
        for rest in lines {
            self.write(&format!("   {}", style(rest).dim()));
        }
    }
}
