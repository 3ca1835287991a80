use anyhow::Result;
use console::{Term, style};
use media_dupes::{ConfigManager, EntryStatus};

use super::open_queue_session;

pub async fn handle_list(
    config_manager: &ConfigManager,
    detailed: bool,
    verbose: bool,
) -> Result<()> {
    let term = Term::stdout();
    let session = open_queue_session(config_manager, verbose)?;
    let entries = session.manager.snapshot();

    if entries.is_empty() {
        term.write_line(&format!("{} The todo list is empty", style("📭").dim()))?;
        term.write_line(&format!(
            "{} Add URLs with 'media-dupes add <URL>'",
            style("💡").yellow()
        ))?;
        return Ok(());
    }

    term.write_line(&format!(
        "{} Todo list ({} URLs):",
        style("📋").cyan(),
        entries.len()
    ))?;

    for (index, entry) in entries.iter().enumerate() {
        if detailed {
            let status = match entry.status {
                EntryStatus::Pending => style(entry.status.to_string()).dim(),
                EntryStatus::Running => style(entry.status.to_string()).blue(),
                EntryStatus::Succeeded => style(entry.status.to_string()).green(),
                EntryStatus::Failed => style(entry.status.to_string()).red(),
            };
            let playlist = if entry.is_possible_playlist() {
                format!(" {}", style("[playlist?]").yellow())
            } else {
                String::new()
            };
            term.write_line(&format!(
                "  {:>3}. {} [{}]{}",
                index + 1,
                style(&entry.url).cyan(),
                status,
                playlist
            ))?;
        } else {
            term.write_line(&format!("  {:>3}. {}", index + 1, entry.url))?;
        }
    }

    if detailed {
        term.write_line("")?;
        term.write_line(&format!(
            "{} Download directory: {}",
            style("📁").cyan(),
            style(config_manager.config().resolve_download_dir().display()).cyan()
        ))?;
    }

    Ok(())
}
