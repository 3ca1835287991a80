use anyhow::Result;
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use media_dupes::ConfigManager;
use std::process;
use std::time::Duration;

use super::launcher;

pub async fn handle_extractors(
    config_manager: &ConfigManager,
    filter: Option<String>,
) -> Result<()> {
    let term = Term::stdout();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.blue} {msg}")?);
    spinner.set_message("Asking the downloader for its extractors...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = launcher(config_manager).list_extractors().await;
    spinner.finish_and_clear();

    let extractors = match result {
        Ok(extractors) => extractors,
        Err(e) => {
            term.write_line(&format!("{} {}", style("❌").red(), e))?;
            term.write_line(&format!(
                "{} Run 'media-dupes doctor' to check the downloader setup",
                style("💡").yellow()
            ))?;
            process::exit(1);
        }
    };

    let needle = filter.as_deref().map(str::to_lowercase);
    let matching: Vec<&String> = extractors
        .iter()
        .filter(|name| match &needle {
            Some(needle) => name.to_lowercase().contains(needle),
            None => true,
        })
        .collect();

    if matching.is_empty() {
        term.write_line(&format!("{} No matching extractors", style("📭").dim()))?;
        return Ok(());
    }

    for name in &matching {
        term.write_line(&format!("  • {}", name))?;
    }
    term.write_line(&format!(
        "{} {} of {} extractors",
        style("📦").cyan(),
        matching.len(),
        extractors.len()
    ))?;

    Ok(())
}
