use anyhow::Result;
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use media_dupes::download::DownloadEvent;
use media_dupes::{AudioFormat, BatchOutcome, ConfigManager, TaskRunner};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::{launcher, open_session};

pub struct StartOptions {
    pub mode: String,
    pub format: Option<String>,
    pub verbose_tool: bool,
    pub max_concurrent: Option<usize>,
    pub output_dir: Option<String>,
}

pub async fn handle_start(
    config_manager: &ConfigManager,
    options: StartOptions,
    verbose: bool,
) -> Result<()> {
    let term = Term::stdout();
    let config = config_manager.config();

    let mut settings = config.download_settings();
    if let Some(format) = &options.format {
        match format.parse::<AudioFormat>() {
            Ok(format) => settings.audio_format = format,
            Err(e) => {
                term.write_line(&format!("{} {}", style("❌").red(), e))?;
                term.write_line(&format!(
                    "{} Supported formats: {}",
                    style("💡").yellow(),
                    AudioFormat::ALL
                        .iter()
                        .map(AudioFormat::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))?;
                process::exit(1);
            }
        }
    }
    if options.verbose_tool {
        settings.verbose = true;
    }
    if let Some(dir) = &options.output_dir {
        settings.download_dir = PathBuf::from(dir);
    }

    let max_concurrent = options
        .max_concurrent
        .unwrap_or(config.general.max_concurrent_downloads);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let runner = TaskRunner::new(Arc::new(launcher(config_manager)))
        .with_max_concurrent(max_concurrent)
        .with_events(event_tx);
    let mut session = open_session(config_manager, runner, verbose)?;
    let total = session.manager.queue_len();

    if total > 0 {
        term.write_line(&format!(
            "{} Downloading {} URL(s) as {} into {}",
            style("⬇️").cyan(),
            total,
            style(&options.mode).cyan().bold(),
            style(settings.download_dir.display()).cyan()
        ))?;
    }

    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("#>-"),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    session.notifier.attach_progress(bar.clone());

    let progress = bar.clone();
    let events = tokio::spawn(async move {
        let mut running = 0usize;
        while let Some(event) = event_rx.recv().await {
            match event {
                DownloadEvent::Started { url } => {
                    running += 1;
                    progress.set_message(format!("({} running) {}", running, url));
                }
                DownloadEvent::Finished { .. } => {
                    running = running.saturating_sub(1);
                    progress.inc(1);
                    progress.set_message(format!("({} running)", running));
                }
            }
        }
    });

    let result = session
        .manager
        .download_named(&options.mode, &settings)
        .await;

    events.abort();
    if let Some(bar) = session.notifier.detach_progress() {
        bar.finish_and_clear();
    }
    session.persist()?;

    let summary = match result {
        Ok(summary) => summary,
        // the manager has already reported why
        Err(_) => process::exit(1),
    };

    term.write_line("")?;
    term.write_line(&format!("{} Batch summary:", style("📊").cyan()))?;
    term.write_line(&format!("   {}: {}", style("Mode").dim(), summary.mode))?;
    term.write_line(&format!(
        "   {}: {}",
        style("Started").dim(),
        summary.started_at.format("%Y-%m-%d %H:%M:%S")
    ))?;
    term.write_line(&format!(
        "   {}: {:.1}s",
        style("Elapsed").dim(),
        summary.elapsed.as_secs_f64()
    ))?;
    term.write_line(&format!(
        "   {}: {}",
        style("Succeeded").dim(),
        style(summary.succeeded).green()
    ))?;
    if summary.failed > 0 {
        term.write_line(&format!(
            "   {}: {}",
            style("Failed").dim(),
            style(summary.failed).red()
        ))?;
        for url in &summary.failed_urls {
            term.write_line(&format!("     • {}", url))?;
        }
        term.write_line(&format!(
            "{} Re-add failed URLs with 'media-dupes add' to retry them",
            style("💡").yellow()
        ))?;
    }

    if summary.outcome == BatchOutcome::AllFailed {
        process::exit(1);
    }

    Ok(())
}
