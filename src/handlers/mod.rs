pub mod add;
pub mod clear;
pub mod config;
pub mod doctor;
pub mod extractors;
pub mod list;
pub mod remove;
pub mod start;
pub mod terminal;

use crate::cli::{Commands, ConfigAction};
use anyhow::{Context, Result};
use media_dupes::{
    ConfigManager, DownloadManager, FsDirectoryValidator, JsonQueueStore, TaskRunner,
    YtDlpLauncher,
};
use std::sync::Arc;

use self::terminal::ConsoleNotifier;

// Re-export all handlers
pub use add::handle_add;
pub use clear::handle_clear;
pub use config::handle_config;
pub use doctor::handle_doctor;
pub use extractors::handle_extractors;
pub use list::handle_list;
pub use remove::handle_remove;
pub use start::handle_start;

/// Check if config validation should be skipped for certain commands
pub fn should_skip_config_validation(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Config {
            action: ConfigAction::Validate
                | ConfigAction::Reset { .. }
                | ConfigAction::Set { .. }
                | ConfigAction::Edit { .. }
                | ConfigAction::Path
        }
    )
}

/// A manager with the stored todo list loaded, plus the store to write it back.
pub struct Session {
    pub manager: DownloadManager,
    pub store: JsonQueueStore,
    pub notifier: Arc<ConsoleNotifier>,
}

impl Session {
    pub fn persist(&self) -> Result<()> {
        self.manager
            .persist_to(&self.store)
            .with_context(|| format!("Failed to save todo list to {:?}", self.store.path()))
    }
}

pub fn launcher(config_manager: &ConfigManager) -> YtDlpLauncher {
    YtDlpLauncher::new(&config_manager.config().binaries.downloader)
}

/// Restores the todo list from the data directory into a fresh manager.
pub fn open_session(
    config_manager: &ConfigManager,
    runner: TaskRunner,
    verbose: bool,
) -> Result<Session> {
    let notifier = Arc::new(ConsoleNotifier::new(verbose));
    let store = JsonQueueStore::new(config_manager.queue_file());
    let mut manager = DownloadManager::new(
        runner,
        Arc::new(FsDirectoryValidator),
        Arc::clone(&notifier) as Arc<dyn media_dupes::Notifier>,
    );
    manager
        .restore_from(&store)
        .with_context(|| format!("Failed to read todo list from {:?}", store.path()))?;

    Ok(Session {
        manager,
        store,
        notifier,
    })
}

/// Session for commands that only edit the todo list.
pub fn open_queue_session(config_manager: &ConfigManager, verbose: bool) -> Result<Session> {
    let runner = TaskRunner::new(Arc::new(launcher(config_manager)));
    open_session(config_manager, runner, verbose)
}
