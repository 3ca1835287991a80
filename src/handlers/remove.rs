use anyhow::Result;
use console::{Term, style};
use media_dupes::ConfigManager;
use std::process;

use super::open_queue_session;

pub async fn handle_remove(
    config_manager: &ConfigManager,
    url: String,
    verbose: bool,
) -> Result<()> {
    let term = Term::stdout();
    let mut session = open_queue_session(config_manager, verbose)?;

    if !session.manager.remove_url(&url) {
        term.write_line(&format!(
            "{} {} is not part of the todo list",
            style("❌").red(),
            style(url.trim()).cyan()
        ))?;
        term.write_line(&format!(
            "{} Use 'media-dupes list' to see the queued URLs",
            style("💡").yellow()
        ))?;
        process::exit(1);
    }

    session.persist()?;
    term.write_line(&format!(
        "{} Removed {} ({} left)",
        style("🗑️").green(),
        style(url.trim()).cyan(),
        session.manager.queue_len()
    ))?;

    Ok(())
}
