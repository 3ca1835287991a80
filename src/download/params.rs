use crate::error::DupesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_AUDIO_TEMPLATE: &str =
    "%(track_number)s-%(artist)s-%(album)s-%(title)s-%(id)s.%(ext)s";
pub const DEFAULT_VIDEO_TEMPLATE: &str = "%(title)s-%(id)s.%(ext)s";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    Audio,
    Video,
}

impl DownloadMode {
    /// Sub-directory of the download directory used for this mode.
    pub fn folder_name(&self) -> &'static str {
        match self {
            DownloadMode::Audio => "Audio",
            DownloadMode::Video => "Video",
        }
    }
}

impl FromStr for DownloadMode {
    type Err = DupesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" => Ok(DownloadMode::Audio),
            "video" => Ok(DownloadMode::Video),
            _ => Err(DupesError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for DownloadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadMode::Audio => write!(f, "audio"),
            DownloadMode::Video => write!(f, "video"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Best,
    Aac,
    Flac,
    #[default]
    Mp3,
    M4a,
    Opus,
    Vorbis,
    Wav,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 8] = [
        AudioFormat::Best,
        AudioFormat::Aac,
        AudioFormat::Flac,
        AudioFormat::Mp3,
        AudioFormat::M4a,
        AudioFormat::Opus,
        AudioFormat::Vorbis,
        AudioFormat::Wav,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Best => "best",
            AudioFormat::Aac => "aac",
            AudioFormat::Flac => "flac",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Opus => "opus",
            AudioFormat::Vorbis => "vorbis",
            AudioFormat::Wav => "wav",
        }
    }

    /// Only these containers can carry embedded cover art.
    pub fn supports_embedded_thumbnail(&self) -> bool {
        matches!(self, AudioFormat::Mp3 | AudioFormat::M4a)
    }
}

impl FromStr for AudioFormat {
    type Err = DupesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        AudioFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == wanted)
            .ok_or_else(|| DupesError::InvalidAudioFormat(s.to_string()))
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration snapshot taken when a batch starts.
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub audio_format: AudioFormat,
    pub verbose: bool,
    pub additional_parameters: String,
    pub download_dir: PathBuf,
    pub ffmpeg_path: PathBuf,
    pub audio_template: String,
    pub video_template: String,
    pub no_mtime: bool,
}

impl DownloadSettings {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            audio_format: AudioFormat::default(),
            verbose: false,
            additional_parameters: String::new(),
            download_dir: download_dir.into(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            audio_template: DEFAULT_AUDIO_TEMPLATE.to_string(),
            video_template: DEFAULT_VIDEO_TEMPLATE.to_string(),
            no_mtime: false,
        }
    }

    pub fn with_audio_format(mut self, audio_format: AudioFormat) -> Self {
        self.audio_format = audio_format;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_additional_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.additional_parameters = parameters.into();
        self
    }

    pub fn with_ffmpeg_path(mut self, ffmpeg_path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = ffmpeg_path.into();
        self
    }

    pub fn output_template(&self, mode: DownloadMode) -> PathBuf {
        let template = match mode {
            DownloadMode::Audio => &self.audio_template,
            DownloadMode::Video => &self.video_template,
        };
        self.download_dir.join(mode.folder_name()).join(template)
    }

    pub fn extra_flags(&self) -> Vec<String> {
        self.additional_parameters
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

pub struct ParameterBuilder;

impl ParameterBuilder {
    /// Builds the downloader argument list for one batch. The URL itself is
    /// not part of it.
    pub fn build(mode: DownloadMode, settings: &DownloadSettings) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--ignore-errors".into(),
            "--format".into(),
            match mode {
                DownloadMode::Audio => "bestaudio".into(),
                DownloadMode::Video => "best".into(),
            },
            "--output".into(),
            settings.output_template(mode).to_string_lossy().into_owned(),
            "--restrict-filenames".into(),
            "--continue".into(),
        ];

        if settings.no_mtime {
            args.push("--no-mtime".into());
        }

        args.extend([
            "--prefer-ffmpeg".to_string(),
            "--ffmpeg-location".to_string(),
            settings.ffmpeg_path.to_string_lossy().into_owned(),
            "--add-metadata".to_string(),
        ]);

        if mode == DownloadMode::Audio {
            args.extend([
                "--audio-format".to_string(),
                settings.audio_format.to_string(),
                "--extract-audio".to_string(),
                "--audio-quality".to_string(),
                "0".to_string(),
            ]);
        }

        args.extend(["--fixup".to_string(), "detect_or_warn".to_string()]);

        if mode == DownloadMode::Audio && settings.audio_format.supports_embedded_thumbnail() {
            args.insert(0, "--embed-thumbnail".into());
        }

        if settings.verbose {
            args.insert(0, "--verbose".into());
            args.insert(0, "--print-traffic".into());
        }

        // Last so the downloader's last-wins parsing lets them override.
        args.extend(settings.extra_flags());
        args
    }

    /// Same as [`ParameterBuilder::build`] for a mode given by name.
    pub fn build_named(
        mode: &str,
        settings: &DownloadSettings,
    ) -> Result<Vec<String>, DupesError> {
        Ok(Self::build(mode.parse()?, settings))
    }
}
