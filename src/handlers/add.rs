use anyhow::Result;
use console::{Term, style};
use media_dupes::{ConfigManager, DupesError};
use std::process;

use super::open_queue_session;

pub async fn handle_add(
    config_manager: &ConfigManager,
    urls: Vec<String>,
    verbose: bool,
) -> Result<()> {
    let term = Term::stdout();
    let mut session = open_queue_session(config_manager, verbose)?;

    let mut added = 0;
    let mut rejected = 0;
    for url in urls.iter().filter(|url| !url.trim().is_empty()) {
        match session.manager.add_url(url) {
            Ok(entry) => {
                added += 1;
                let hint = if entry.possible_playlist {
                    format!(" {}", style("(might be a playlist)").yellow())
                } else {
                    String::new()
                };
                term.write_line(&format!(
                    "{} Added {}{}",
                    style("➕").green(),
                    style(&entry.url).cyan(),
                    hint
                ))?;
            }
            // already reported through the notifier
            Err(DupesError::InvalidUrl(_)) | Err(DupesError::DuplicateUrl(_)) => rejected += 1,
            Err(e) => return Err(e.into()),
        }
    }

    if added > 0 {
        session.persist()?;
    }

    term.write_line(&format!(
        "{} {} URL(s) in the todo list",
        style("📋").cyan(),
        session.manager.queue_len()
    ))?;

    if added == 0 && rejected > 0 {
        process::exit(1);
    }

    Ok(())
}
