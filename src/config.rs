use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::audio::bands::Mode;

pub const CHUNK_SIZE: usize = 1024;
/// Band edges in bins: ~300 Hz (excluded below), 440, 880, 1760, 3400 Hz, Nyquist.
pub const AUDIBLE_RANGE: [usize; 6] = [7, 10, 20, 40, 80, 512];
/// Band edges in bins around 20.0, 20.1, 20.2, 20.3 kHz, Nyquist.
pub const ULTRASOUND_RANGE: [usize; 5] = [463, 465, 467, 469, 512];
pub const FILTER_WINDOW_SIZE: usize = 40;
pub const ULTRASOUND_ABS_MIN_AMP: f64 = 8.0;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_audible_range")]
    pub audible_range: Vec<usize>,
    #[serde(default = "default_ultrasound_range")]
    pub ultrasound_range: Vec<usize>,
    #[serde(default = "default_filter_window_size")]
    pub filter_window_size: usize,
    #[serde(default = "default_abs_min_amp")]
    pub abs_min_amp: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u32,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("chunk_size must be at least 2, got {0}")]
    ChunkSize(usize),
    #[error("filter_window_size must be positive")]
    FilterWindow,
    #[error("abs_min_amp must be a positive finite number, got {0}")]
    Floor(f64),
    #[error("{0} band table is empty")]
    EmptyBands(&'static str),
    #[error("{table} band table is not strictly increasing at index {index}")]
    UnorderedBands { table: &'static str, index: usize },
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            audible_range: default_audible_range(),
            ultrasound_range: default_ultrasound_range(),
            filter_window_size: default_filter_window_size(),
            abs_min_amp: default_abs_min_amp(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            audio_bitrate: default_audio_bitrate(),
            video_extensions: default_video_extensions(),
        }
    }
}

impl AnalysisConfig {
    pub fn band_table(&self, mode: Mode) -> &[usize] {
        match mode {
            Mode::Audible => &self.audible_range,
            Mode::Ultrasound => &self.ultrasound_range,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size < 2 {
            return Err(ConfigError::ChunkSize(self.chunk_size));
        }
        if self.filter_window_size == 0 {
            return Err(ConfigError::FilterWindow);
        }
        if !(self.abs_min_amp.is_finite() && self.abs_min_amp > 0.0) {
            return Err(ConfigError::Floor(self.abs_min_amp));
        }
        check_bands("audible", &self.audible_range)?;
        check_bands("ultrasound", &self.ultrasound_range)
    }
}

fn check_bands(table: &'static str, bands: &[usize]) -> Result<(), ConfigError> {
    if bands.is_empty() {
        return Err(ConfigError::EmptyBands(table));
    }
    match bands.windows(2).position(|w| w[0] >= w[1]) {
        Some(i) => Err(ConfigError::UnorderedBands { table, index: i + 1 }),
        None => Ok(()),
    }
}

fn default_chunk_size() -> usize { CHUNK_SIZE }
fn default_audible_range() -> Vec<usize> { AUDIBLE_RANGE.to_vec() }
fn default_ultrasound_range() -> Vec<usize> { ULTRASOUND_RANGE.to_vec() }
fn default_filter_window_size() -> usize { FILTER_WINDOW_SIZE }
fn default_abs_min_amp() -> f64 { ULTRASOUND_ABS_MIN_AMP }
fn default_ffmpeg() -> String { "ffmpeg".into() }
fn default_sample_rate() -> u32 { 44_100 }
fn default_channels() -> u32 { 2 }
fn default_audio_bitrate() -> String { "160k".into() }
fn default_video_extensions() -> Vec<String> {
    ["mp4", "mov", "mkv", "avi", "webm", "m4v"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Invalid config TOML")?;
    config.analysis.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    parse_config(&content)
}

/// First existing of `./peakscan.toml`, `~/.config/peakscan/config.toml`, or
/// the platform config dir.
fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("peakscan.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("peakscan").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("peakscan").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

/// An explicit `--config` must load cleanly. An auto-detected file that fails
/// to load is reported and replaced by defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        let config = load_config(path)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        return Ok(config);
    }

    match find_config_file() {
        Some(path) => match load_config(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(err) => {
                log::warn!("Ignoring config {}: {:#}", path.display(), err);
                Ok(Config::default())
            }
        },
        None => Ok(Config::default()),
    }
}
