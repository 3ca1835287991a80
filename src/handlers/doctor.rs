use anyhow::Result;
use console::{Term, style};
use media_dupes::download::run_tool;
use media_dupes::{ConfigManager, DirectoryValidator, FsDirectoryValidator};
use std::path::Path;
use std::process;

use super::launcher;

/// Checks the binaries and the download directory a batch depends on.
pub async fn handle_doctor(config_manager: &ConfigManager) -> Result<()> {
    let term = Term::stdout();
    let config = config_manager.config();
    let mut problems = 0;

    term.write_line(&format!("{} Checking environment...", style("🔍").cyan()))?;

    let downloader = launcher(config_manager);
    match downloader.version().await {
        Ok(version) => term.write_line(&format!(
            "{} {} {}",
            style("✅").green(),
            style(downloader.binary().display()).cyan(),
            version
        ))?,
        Err(e) => {
            problems += 1;
            term.write_line(&format!(
                "{} {}: {}",
                style("❌").red(),
                style(downloader.binary().display()).cyan(),
                e
            ))?;
        }
    }

    match run_tool(Path::new(&config.binaries.ffmpeg), &["-version"]).await {
        Ok(output) => term.write_line(&format!(
            "{} {}",
            style("✅").green(),
            output.lines().next().unwrap_or_default()
        ))?,
        Err(e) => {
            problems += 1;
            term.write_line(&format!(
                "{} {}: {}",
                style("❌").red(),
                style(&config.binaries.ffmpeg).cyan(),
                e
            ))?;
        }
    }

    let dir = config.resolve_download_dir();
    let validator = FsDirectoryValidator;
    if !validator.is_available(&dir) {
        problems += 1;
        term.write_line(&format!(
            "{} Download directory {} does not exist",
            style("❌").red(),
            style(dir.display()).cyan()
        ))?;
    } else if !validator.is_writeable(&dir) {
        problems += 1;
        term.write_line(&format!(
            "{} Download directory {} is not writeable",
            style("❌").red(),
            style(dir.display()).cyan()
        ))?;
    } else {
        term.write_line(&format!(
            "{} Download directory {}",
            style("✅").green(),
            style(dir.display()).cyan()
        ))?;
    }

    if problems > 0 {
        term.write_line(&format!(
            "{} {} problem(s) found. Adjust them with 'media-dupes config set'",
            style("💡").yellow(),
            problems
        ))?;
        process::exit(1);
    }

    term.write_line(&format!("{} Ready to download", style("🚀").green()))?;
    Ok(())
}
