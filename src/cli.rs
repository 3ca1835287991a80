use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "media-dupes")]
#[command(about = "Queue media URLs and download them with yt-dlp and ffmpeg")]
#[command(long_about = "
media-dupes keeps a todo list of media URLs and downloads all of them in one
batch through yt-dlp (or youtube-dl), using ffmpeg for post-processing.
The todo list is kept between runs until a batch finishes.

Examples:
  media-dupes add https://vimeo.com/315670384
  media-dupes list
  media-dupes start audio --format flac
  media-dupes start video --max-concurrent 2
  media-dupes config set general.download_dir ~/Music
")]
#[command(version)]
pub struct Cli {
    /// Override config file path
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add URLs to the todo list
    #[command(visible_alias = "a")]
    Add {
        /// One or more URLs
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Remove a URL from the todo list
    #[command(visible_alias = "rm")]
    Remove {
        /// URL to remove
        url: String,
    },

    /// Show the todo list
    #[command(visible_alias = "ls")]
    List {
        /// Show status and playlist hints
        #[arg(short = 'l', long)]
        long: bool,
    },

    /// Empty the todo list
    #[command(visible_alias = "reset")]
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Download every URL of the todo list
    #[command(visible_alias = "s")]
    Start {
        /// Download mode: audio or video
        mode: String,

        /// Audio format override (best, aac, flac, mp3, m4a, opus, vorbis, wav)
        #[arg(short, long, value_name = "FORMAT")]
        format: Option<String>,

        /// Pass --verbose and --print-traffic to the downloader
        #[arg(long)]
        verbose_tool: bool,

        /// Maximum downloads running at once (0 = all at once)
        #[arg(short, long, value_name = "N")]
        max_concurrent: Option<usize>,

        /// Download directory override
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<String>,
    },

    /// Manage configuration
    #[command(visible_alias = "cfg")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Check that the downloader and ffmpeg can be executed
    Doctor,

    /// List the sites supported by the downloader
    Extractors {
        /// Only show extractors containing this text
        filter: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the config file location
    Path,

    /// Get a configuration value
    Get {
        /// Configuration key (e.g., general.audio_format)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., general.audio_format)
        key: String,

        /// Configuration value
        value: String,
    },

    /// Validate configuration
    #[command(visible_alias = "check")]
    Validate,

    /// Reset configuration to defaults
    Reset {
        /// Section to reset (general, binaries, output); resets all if omitted
        #[arg(short, long, value_name = "SECTION")]
        section: Option<String>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Edit configuration file
    Edit {
        /// Editor to use (overrides $EDITOR)
        #[arg(short, long, value_name = "EDITOR")]
        editor: Option<String>,
    },
}

impl Cli {
    /// Validate CLI arguments and show helpful error messages
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Commands::Add { urls } => {
                if urls.iter().all(|url| url.trim().is_empty()) {
                    return Err("At least one non-empty URL is required".to_string());
                }
            }
            Commands::Remove { url } => {
                if url.trim().is_empty() {
                    return Err("URL cannot be empty".to_string());
                }
            }
            Commands::Start { max_concurrent, .. } => {
                if matches!(max_concurrent, Some(n) if *n > 64) {
                    return Err("Max concurrent downloads must be between 0 and 64".to_string());
                }
            }
            _ => {}
        }
        Ok(())
    }
}
