//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, StatusError};

/// Full surface configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub slideshow: SlideshowConfig,
    pub client: ClientConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Viewport thresholds that gate the slideshow sub-view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SlideshowConfig {
    /// Below this viewport height (px) the slideshow is never shown.
    pub min_height_for_slideshow: u32,
    /// Below this viewport height (px) only the caption strip is shown.
    pub min_height_for_image: u32,
    /// Bottom padding of the caption strip in caption-only density.
    pub caption_bottom_padding_px: u32,
}

/// Where the compute client publishes its status and accepts requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    pub state_file: PathBuf,
    pub control_file: PathBuf,
    pub poll_interval_ms: u64,
    pub battery_capacity_path: PathBuf,
}

/// JSONL activity log tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub jsonl_log: PathBuf,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
    pub fsync_interval_secs: u64,
}

/// Filesystem paths used by cstat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            min_height_for_slideshow: 1_000,
            min_height_for_image: 1_000,
            caption_bottom_padding_px: 5,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        let data = data_dir();
        Self {
            state_file: data.join("client-status.json"),
            control_file: data.join("run-mode.json"),
            poll_interval_ms: 1_000,
            battery_capacity_path: PathBuf::from("/sys/class/power_supply/BAT0/capacity"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            jsonl_log: data_dir().join("surface.jsonl"),
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
            fsync_interval_secs: 30,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: home_dir().join(".config").join("cstat").join("config.toml"),
        }
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[CST-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

fn data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("cstat")
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| StatusError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(StatusError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for the startup log event.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // slideshow
        if let Some(raw) = lookup("CSTAT_MIN_HEIGHT_FOR_SLIDESHOW") {
            self.slideshow.min_height_for_slideshow =
                parse_env_u32("CSTAT_MIN_HEIGHT_FOR_SLIDESHOW", &raw)?;
        }
        if let Some(raw) = lookup("CSTAT_MIN_HEIGHT_FOR_IMAGE") {
            self.slideshow.min_height_for_image =
                parse_env_u32("CSTAT_MIN_HEIGHT_FOR_IMAGE", &raw)?;
        }

        // client
        if let Some(raw) = lookup("CSTAT_STATE_FILE") {
            self.client.state_file = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CSTAT_CONTROL_FILE") {
            self.client.control_file = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("CSTAT_POLL_INTERVAL_MS") {
            self.client.poll_interval_ms = parse_env_u64("CSTAT_POLL_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("CSTAT_BATTERY_CAPACITY_PATH") {
            self.client.battery_capacity_path = PathBuf::from(raw);
        }

        // logging
        if let Some(raw) = lookup("CSTAT_LOG_ENABLED") {
            self.logging.enabled = parse_env_bool("CSTAT_LOG_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("CSTAT_JSONL_LOG") {
            self.logging.jsonl_log = PathBuf::from(raw);
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.client.poll_interval_ms == 0 {
            return Err(StatusError::InvalidConfig {
                details: "client.poll_interval_ms must be > 0".to_string(),
            });
        }
        if self.client.state_file == self.client.control_file {
            return Err(StatusError::InvalidConfig {
                details: "client.state_file and client.control_file must differ".to_string(),
            });
        }

        if self.logging.enabled && self.logging.max_size_bytes == 0 {
            return Err(StatusError::InvalidConfig {
                details: "logging.max_size_bytes must be > 0".to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u32(name: &str, raw: &str) -> Result<u32> {
    raw.parse::<u32>().map_err(|error| StatusError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>().map_err(|error| StatusError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.parse::<bool>().map_err(|error| StatusError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
