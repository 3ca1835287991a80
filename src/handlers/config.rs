use crate::cli::ConfigAction;
use anyhow::Result;
use console::{Term, style};
use dialoguer::Confirm;
use media_dupes::ConfigManager;
use std::process;

pub async fn handle_config(config_manager: &mut ConfigManager, action: ConfigAction) -> Result<()> {
    let term = Term::stdout();

    match action {
        ConfigAction::Show => {
            let config_content = toml::to_string_pretty(config_manager.config())?;
            term.write_line(&format!("{} Current configuration:", style("⚙️").cyan()))?;
            term.write_line("")?;
            term.write_line(&config_content)?;
            term.write_line(&format!(
                "{} Effective download directory: {}",
                style("📁").cyan(),
                style(config_manager.config().resolve_download_dir().display()).cyan()
            ))?;
        }

        ConfigAction::Path => {
            term.write_line(&config_manager.config_file().display().to_string())?;
        }

        ConfigAction::Get { key } => match config_manager.get_value(&key) {
            Ok(value) => term.write_line(&value)?,
            Err(e) => {
                term.write_line(&format!("{} {}", style("❌").red(), e))?;
                process::exit(1);
            }
        },

        ConfigAction::Set { key, value } => {
            if let Err(e) = config_manager.set_value(&key, &value) {
                term.write_line(&format!("{} {}", style("❌").red(), e))?;
                process::exit(1);
            }
            config_manager.save()?;
            term.write_line(&format!(
                "{} Set {} = {}",
                style("✅").green(),
                style(&key).cyan(),
                style(&value).green()
            ))?;
        }

        ConfigAction::Edit { editor } => {
            term.write_line(&format!(
                "{} Config file location: {:?}",
                style("📝").cyan(),
                config_manager.config_file()
            ))?;

            let editor_cmd = editor
                .or_else(|| std::env::var("EDITOR").ok())
                .unwrap_or_else(|| {
                    if cfg!(target_os = "windows") {
                        "notepad".to_string()
                    } else {
                        "nano".to_string()
                    }
                });

            let status = std::process::Command::new(&editor_cmd)
                .arg(config_manager.config_file())
                .status()?;

            if !status.success() {
                term.write_line(&format!("{} Editor exited with error", style("❌").red()))?;
                process::exit(1);
            }

            config_manager.reload()?;
            match config_manager.validate() {
                Ok(()) => {
                    term.write_line(&format!("{} Configuration edited", style("✅").green()))?
                }
                Err(e) => {
                    term.write_line(&format!(
                        "{} Edited configuration is invalid: {}",
                        style("⚠️").yellow(),
                        e
                    ))?;
                }
            }
        }

        ConfigAction::Validate => {
            term.write_line(&format!(
                "{} Validating configuration...",
                style("🔍").cyan()
            ))?;

            match config_manager.validate() {
                Ok(()) => {
                    term.write_line(&format!("{} Configuration is valid", style("✅").green()))?;
                }
                Err(e) => {
                    term.write_line(&format!(
                        "{} Configuration validation failed:",
                        style("❌").red()
                    ))?;
                    term.write_line(&format!("   {}", e))?;
                    term.write_line(&format!(
                        "{} Run 'media-dupes config reset' to restore the defaults",
                        style("💡").yellow()
                    ))?;
                    process::exit(1);
                }
            }
        }

        ConfigAction::Reset { section, yes } => {
            let target = section.as_deref().unwrap_or("all configuration");

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Are you sure you want to reset {}?",
                        style(target).cyan()
                    ))
                    .default(false)
                    .interact()?;

                if !confirmed {
                    term.write_line(&format!("{} Operation cancelled", style("❌").red()))?;
                    return Ok(());
                }
            }

            if let Err(e) = config_manager.reset(section.as_deref()) {
                term.write_line(&format!("{} {}", style("❌").red(), e))?;
                process::exit(1);
            }
            config_manager.save()?;
            term.write_line(&format!("{} Reset {}", style("🔄").green(), target))?;
        }
    }
    Ok(())
}
