use anyhow::Result;
use console::{Term, style};
use dialoguer::Confirm;
use media_dupes::ConfigManager;

use super::open_queue_session;

pub async fn handle_clear(config_manager: &ConfigManager, yes: bool, verbose: bool) -> Result<()> {
    let term = Term::stdout();
    let mut session = open_queue_session(config_manager, verbose)?;
    let count = session.manager.queue_len();

    if count == 0 {
        term.write_line(&format!("{} The todo list is already empty", style("📭").dim()))?;
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove all {} URLs from the todo list?",
                style(count).cyan()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            term.write_line(&format!("{} Operation cancelled", style("❌").red()))?;
            return Ok(());
        }
    }

    session.manager.reset();
    session.persist()?;
    term.write_line(&format!(
        "{} Cleared {} URLs from the todo list",
        style("✅").green(),
        count
    ))?;

    Ok(())
}
