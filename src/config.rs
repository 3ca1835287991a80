use anyhow::{Context, Result};
use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::download::params::{DEFAULT_AUDIO_TEMPLATE, DEFAULT_VIDEO_TEMPLATE};
use crate::download::{AudioFormat, DownloadSettings};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub binaries: BinariesConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub audio_format: AudioFormat,
    #[serde(default)]
    pub verbose_mode: bool,
    #[serde(default)]
    pub enable_additional_parameters: bool,
    #[serde(default)]
    pub additional_parameters: String,
    #[serde(default)]
    pub download_dir: Option<String>,
    /// 0 starts every queued download at once.
    #[serde(default)]
    pub max_concurrent_downloads: usize,
    #[serde(default)]
    pub no_mtime: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinariesConfig {
    #[serde(default = "default_downloader")]
    pub downloader: String,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_audio_template")]
    pub audio_template: String,
    #[serde(default = "default_video_template")]
    pub video_template: String,
}

// Default value functions
fn default_downloader() -> String {
    "yt-dlp".to_string()
}
fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}
fn default_audio_template() -> String {
    DEFAULT_AUDIO_TEMPLATE.to_string()
}
fn default_video_template() -> String {
    DEFAULT_VIDEO_TEMPLATE.to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            audio_format: AudioFormat::default(),
            verbose_mode: false,
            enable_additional_parameters: false,
            additional_parameters: String::new(),
            download_dir: None,
            max_concurrent_downloads: 0,
            no_mtime: false,
        }
    }
}

impl Default for BinariesConfig {
    fn default() -> Self {
        Self {
            downloader: default_downloader(),
            ffmpeg: default_ffmpeg(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            audio_template: default_audio_template(),
            video_template: default_video_template(),
        }
    }
}

impl Config {
    /// Configured download directory, else the user's Downloads folder,
    /// else the current directory.
    pub fn resolve_download_dir(&self) -> PathBuf {
        if let Some(dir) = &self.general.download_dir {
            return PathBuf::from(dir);
        }
        UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
    }

    /// Immutable settings snapshot for one batch.
    pub fn download_settings(&self) -> DownloadSettings {
        let additional_parameters = if self.general.enable_additional_parameters {
            self.general.additional_parameters.clone()
        } else {
            String::new()
        };

        DownloadSettings {
            audio_format: self.general.audio_format,
            verbose: self.general.verbose_mode,
            additional_parameters,
            download_dir: self.resolve_download_dir(),
            ffmpeg_path: PathBuf::from(&self.binaries.ffmpeg),
            audio_template: self.output.audio_template.clone(),
            video_template: self.output.video_template.clone(),
            no_mtime: self.general.no_mtime,
        }
    }
}

pub struct ConfigManager {
    config_dir: PathBuf,
    config_file: PathBuf,
    data_dir: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Create a new ConfigManager and load existing config or create default
    pub fn new() -> Result<Self> {
        let project_dirs = ProjectDirs::from("", "", "media-dupes")
            .context("Failed to determine config directory")?;

        let config_dir = project_dirs.config_dir().to_path_buf();
        let data_dir = project_dirs.data_dir().to_path_buf();
        Self::open(config_dir.join("config.toml"), data_dir)
    }

    /// Use an explicit config file; its directory also holds the stored queue.
    pub fn with_config_file(config_file: impl Into<PathBuf>) -> Result<Self> {
        let config_file = config_file.into();
        let data_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self::open(config_file, data_dir)
    }

    fn open(config_file: PathBuf, data_dir: PathBuf) -> Result<Self> {
        let config_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
        }

        let config = if config_file.exists() {
            Self::load_config(&config_file)?
        } else {
            let default_config = Config::default();
            Self::save_config(&config_file, &default_config)?;
            default_config
        };

        Ok(Self {
            config_dir,
            config_file,
            data_dir,
            config,
        })
    }

    /// Get a reference to the current config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the current config
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Save the current config to disk
    pub fn save(&self) -> Result<()> {
        Self::save_config(&self.config_file, &self.config)
    }

    /// Reload config from disk
    pub fn reload(&mut self) -> Result<()> {
        self.config = Self::load_config(&self.config_file)?;
        Ok(())
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Where the queue is kept between runs
    pub fn queue_file(&self) -> PathBuf {
        self.data_dir.join("queue.json")
    }

    /// Replace the whole config, or one section, with defaults
    pub fn reset(&mut self, section: Option<&str>) -> Result<()> {
        match section {
            None => self.config = Config::default(),
            Some("general") => self.config.general = GeneralConfig::default(),
            Some("binaries") => self.config.binaries = BinariesConfig::default(),
            Some("output") => self.config.output = OutputConfig::default(),
            Some(other) => anyhow::bail!("Unknown config section: {}", other),
        }
        Ok(())
    }

    /// Read a single value addressed as `section.key`
    pub fn get_value(&self, key: &str) -> Result<String> {
        let value = match key {
            "general.audio_format" => self.config.general.audio_format.to_string(),
            "general.verbose_mode" => self.config.general.verbose_mode.to_string(),
            "general.enable_additional_parameters" => {
                self.config.general.enable_additional_parameters.to_string()
            }
            "general.additional_parameters" => self.config.general.additional_parameters.clone(),
            "general.download_dir" => self
                .config
                .general
                .download_dir
                .clone()
                .unwrap_or_default(),
            "general.max_concurrent_downloads" => {
                self.config.general.max_concurrent_downloads.to_string()
            }
            "general.no_mtime" => self.config.general.no_mtime.to_string(),
            "binaries.downloader" => self.config.binaries.downloader.clone(),
            "binaries.ffmpeg" => self.config.binaries.ffmpeg.clone(),
            "output.audio_template" => self.config.output.audio_template.clone(),
            "output.video_template" => self.config.output.video_template.clone(),
            _ => anyhow::bail!("Unknown config key: {}", key),
        };
        Ok(value)
    }

    /// Set a single value addressed as `section.key`. Does not save.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let general = &mut self.config.general;
        match key {
            "general.audio_format" => general.audio_format = value.parse()?,
            "general.verbose_mode" => general.verbose_mode = parse_bool(key, value)?,
            "general.enable_additional_parameters" => {
                general.enable_additional_parameters = parse_bool(key, value)?
            }
            "general.additional_parameters" => general.additional_parameters = value.to_string(),
            "general.download_dir" => {
                general.download_dir = (!value.is_empty()).then(|| value.to_string())
            }
            "general.max_concurrent_downloads" => {
                general.max_concurrent_downloads = value
                    .parse()
                    .with_context(|| format!("{} expects a number, got '{}'", key, value))?
            }
            "general.no_mtime" => general.no_mtime = parse_bool(key, value)?,
            "binaries.downloader" => self.config.binaries.downloader = value.to_string(),
            "binaries.ffmpeg" => self.config.binaries.ffmpeg = value.to_string(),
            "output.audio_template" => self.config.output.audio_template = value.to_string(),
            "output.video_template" => self.config.output.video_template = value.to_string(),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Load config from file
    fn load_config(config_file: &Path) -> Result<Config> {
        let content = fs::read_to_string(config_file)
            .with_context(|| format!("Failed to read config file: {:?}", config_file))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_file))?;

        Ok(config)
    }

    /// Save config to file
    fn save_config(config_file: &Path, config: &Config) -> Result<()> {
        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(config_file, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_file))?;

        Ok(())
    }

    /// Validate the current configuration
    pub fn validate(&self) -> Result<()> {
        if self.config.binaries.downloader.trim().is_empty() {
            anyhow::bail!("binaries.downloader cannot be empty");
        }

        if self.config.binaries.ffmpeg.trim().is_empty() {
            anyhow::bail!("binaries.ffmpeg cannot be empty");
        }

        if let Some(dir) = &self.config.general.download_dir {
            if dir.trim().is_empty() {
                anyhow::bail!("general.download_dir cannot be empty when set");
            }
        }

        if self.config.output.audio_template.trim().is_empty()
            || self.config.output.video_template.trim().is_empty()
        {
            anyhow::bail!("output templates cannot be empty");
        }

        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => anyhow::bail!("{} expects true or false, got '{}'", key, value),
    }
}
