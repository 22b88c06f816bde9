use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::default::Default;
use std::fs;
use std::path::{Path, PathBuf};

use crate::providers::gemini;
use crate::render::style::{FontRegistry, StyleOptions};
use crate::render::timing::DEFAULT_MIN_DURATION_SECS;
use crate::render::RenderMode;

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Transcription config
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Compiler settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Base style, CLI flags are layered on top
    #[serde(default)]
    pub style: StyleOptions,

    /// ffmpeg settings
    #[serde(default)]
    pub transcoder: TranscoderConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Transcription provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProvider {
    // @provider: Google Gemini, falls back when no key is available
    #[default]
    Gemini,
    // @provider: Deterministic placeholder subtitles
    Fallback,
}

impl TranscriptionProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
            Self::Fallback => "Fallback",
        }
    }
}

impl std::fmt::Display for TranscriptionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

impl std::str::FromStr for TranscriptionProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "fallback" | "fake" => Ok(Self::Fallback),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Transcription service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscriptionConfig {
    // @field: Provider to use
    #[serde(default)]
    pub provider: TranscriptionProvider,

    // @field: API key, the environment variable is used when empty
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Model name
    #[serde(default = "default_model")]
    pub model: String,

    // @field: Service URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_transcription_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    // @field: Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    // @field: Language the subtitles are written in
    #[serde(default = "default_language")]
    pub language: String,

    // @field: Prompt override, placeholder: {language}
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl TranscriptionConfig {
    /// Get the API key, from the config or the environment
    pub fn get_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }
        std::env::var(API_KEY_ENV).unwrap_or_default()
    }

    /// Get the prompt with the language filled in
    pub fn get_prompt(&self) -> String {
        self.prompt
            .clone()
            .unwrap_or_else(default_prompt)
            .replace("{language}", &self.language)
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            provider: TranscriptionProvider::default(),
            api_key: String::new(),
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_transcription_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            language: default_language(),
            prompt: None,
        }
    }
}

/// Compiler configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RenderConfig {
    /// Rendering strategy
    #[serde(default)]
    pub mode: RenderMode,

    /// Minimum on-screen duration of a line in seconds
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: f64,

    /// Directory font files are resolved against
    #[serde(default = "default_fonts_dir")]
    pub fonts_dir: PathBuf,

    /// Extra font families, name to file
    #[serde(default)]
    pub fonts: BTreeMap<String, PathBuf>,

    /// Use a labelled `-filter_complex` graph instead of `-vf`
    #[serde(default)]
    pub use_filter_complex: bool,
}

impl RenderConfig {
    /// Font registry with the built-in families plus configured extras
    pub fn font_registry(&self) -> FontRegistry {
        let mut registry = FontRegistry::new(self.fonts_dir.clone());
        for (family, file) in &self.fonts {
            registry.register(family.clone(), file.clone());
        }
        registry
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::default(),
            min_duration_secs: default_min_duration_secs(),
            fonts_dir: default_fonts_dir(),
            fonts: BTreeMap::new(),
            use_filter_complex: false,
        }
    }
}

/// ffmpeg configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscoderConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Kill ffmpeg after this many seconds
    #[serde(default = "default_transcode_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Move the moov atom to the front for streaming
    #[serde(default = "default_true")]
    pub faststart: bool,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_transcode_timeout_secs(),
            video_codec: default_video_codec(),
            preset: default_preset(),
            crf: default_crf(),
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            faststart: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_model() -> String {
    gemini::DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    gemini::DEFAULT_ENDPOINT.to_string()
}

fn default_transcription_timeout_secs() -> u64 {
    300 // video uploads are large
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_language() -> String {
    "English".to_string()
}

fn default_prompt() -> String {
    "Create subtitles for this video in {language}.
ROLE: You are an expert video subtitle writer.
RULES:
1. TIMING: Start and end each subtitle exactly when the speech starts and ends.
2. MERGING: Merge very short consecutive sentences into one subtitle line when it does not change the meaning.
3. MINIMUM DURATION: Every subtitle stays on screen for at least 0.5 seconds.
4. PUNCTUATION: Never end a line with a period.
5. OUTPUT: Reply with raw JSON only, no commentary before or after it.
JSON FORMAT:
{ \"subtitles\": [ { \"speaker\": \"Speaker 1\", \"line\": \"subtitle text\", \"startTime\": seconds, \"endTime\": seconds } ] }"
        .to_string()
}

fn default_min_duration_secs() -> f64 {
    DEFAULT_MIN_DURATION_SECS
}

fn default_fonts_dir() -> PathBuf {
    let local = PathBuf::from("fonts");
    if local.is_dir() {
        return local;
    }
    dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .map(|d| d.join("reelsub").join("fonts"))
        .unwrap_or(local)
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_transcode_timeout_secs() -> u64 {
    1800
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "ultrafast".to_string()
}

fn default_crf() -> u8 {
    28
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_audio_bitrate() -> String {
    "96k".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write this configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.transcription.provider == TranscriptionProvider::Gemini && self.transcription.model.trim().is_empty() {
            return Err(anyhow!("Transcription model must not be empty for the Gemini provider"));
        }

        if !self.render.min_duration_secs.is_finite() {
            return Err(anyhow!("render.min_duration_secs must be a finite number"));
        }

        if self.transcoder.crf > 51 {
            return Err(anyhow!("transcoder.crf must be between 0 and 51, got {}", self.transcoder.crf));
        }

        self.style
            .validate()
            .map_err(|e| anyhow!("Invalid style configuration: {}", e))?;

        if self.style.font_file.is_none() {
            if let Some(family) = self.style.font_family.as_deref() {
                if !self.render.font_registry().contains(family) {
                    return Err(anyhow!(
                        "Unknown font family '{}', add it to render.fonts or pass a font file",
                        family
                    ));
                }
            }
        }

        Ok(())
    }

    /// Whether a transcription API key is available, from config or environment
    pub fn has_api_key(&self) -> bool {
        !self.transcription.get_api_key().is_empty()
    }
}
