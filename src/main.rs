mod cli;
mod handlers;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use handlers::start::StartOptions;
use media_dupes::ConfigManager;
use std::process;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Validate CLI arguments first
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    // Logs go to stderr so command output stays pipeable
    let verbose = args.verbose;
    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    let mut config_manager = match &args.config {
        Some(path) => ConfigManager::with_config_file(path)?,
        None => ConfigManager::new()?,
    };

    // Validate config on startup (unless we're about to fix it)
    if !handlers::should_skip_config_validation(&args.command) {
        if let Err(e) = config_manager.validate() {
            eprintln!("Configuration validation failed: {}", e);
            eprintln!("Run 'media-dupes config validate' for details");
            eprintln!("Or 'media-dupes config reset' to restore the defaults");
            process::exit(1);
        }
    }

    match args.command {
        Commands::Add { urls } => {
            handlers::handle_add(&config_manager, urls, verbose).await?;
        }
        Commands::Remove { url } => {
            handlers::handle_remove(&config_manager, url, verbose).await?;
        }
        Commands::List { long } => {
            handlers::handle_list(&config_manager, long || verbose, verbose).await?;
        }
        Commands::Clear { yes } => {
            handlers::handle_clear(&config_manager, yes, verbose).await?;
        }
        Commands::Start {
            mode,
            format,
            verbose_tool,
            max_concurrent,
            output_dir,
        } => {
            let options = StartOptions {
                mode,
                format,
                verbose_tool,
                max_concurrent,
                output_dir,
            };
            handlers::handle_start(&config_manager, options, verbose).await?;
        }
        Commands::Config { action } => {
            handlers::handle_config(&mut config_manager, action).await?;
        }
        Commands::Doctor => {
            handlers::handle_doctor(&config_manager).await?;
        }
        Commands::Extractors { filter } => {
            handlers::handle_extractors(&config_manager, filter).await?;
        }
    }

    Ok(())
}
