//! Configuration management for the field-of-play runtime

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Default attempt allowance.
pub const ATTEMPT_MILLIS: u64 = 60_000;

/// Allowance when an athlete is called twice in a row.
pub const CONSECUTIVE_ATTEMPT_MILLIS: u64 = 120_000;

pub const DEFAULT_BREAK_MILLIS: u64 = 600_000;

pub const DEFAULT_BUS_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub platforms: Vec<PlatformConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_attempt_millis")]
    pub attempt_millis: u64,
    #[serde(default = "default_consecutive_attempt_millis")]
    pub consecutive_attempt_millis: u64,
    #[serde(default = "default_break_millis")]
    pub default_break_millis: u64,
}

/// Events buffered per display on the UI bus. Inputs are queued without
/// limit and never dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    #[serde(default = "default_bus_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub name: String,
    #[serde(default)]
    pub start_time_automatically: bool,
}

fn default_attempt_millis() -> u64 {
    ATTEMPT_MILLIS
}

fn default_consecutive_attempt_millis() -> u64 {
    CONSECUTIVE_ATTEMPT_MILLIS
}

fn default_break_millis() -> u64 {
    DEFAULT_BREAK_MILLIS
}

fn default_bus_capacity() -> usize {
    DEFAULT_BUS_CAPACITY
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            attempt_millis: ATTEMPT_MILLIS,
            consecutive_attempt_millis: CONSECUTIVE_ATTEMPT_MILLIS,
            default_break_millis: DEFAULT_BREAK_MILLIS,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}

impl PlatformConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_time_automatically: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration with a single platform
    pub fn default_config() -> Self {
        Self {
            timing: TimingConfig::default(),
            bus: BusConfig::default(),
            platforms: vec![PlatformConfig::new("A")],
        }
    }

    /// Check platform names and timing values
    pub fn validate(&self) -> Result<()> {
        if self.platforms.is_empty() {
            return Err(ConfigError::MissingField("platforms".to_string()).into());
        }

        let mut seen = HashSet::new();
        for platform in &self.platforms {
            if platform.name.trim().is_empty() {
                return Err(ConfigError::Invalid("platform name cannot be empty".to_string()).into());
            }
            if !seen.insert(platform.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate platform name: {}",
                    platform.name
                ))
                .into());
            }
        }

        if self.timing.attempt_millis == 0 || self.timing.consecutive_attempt_millis == 0 {
            return Err(ConfigError::Invalid("attempt allowances must be > 0".to_string()).into());
        }

        if self.bus.capacity == 0 {
            return Err(ConfigError::Invalid("bus.capacity must be > 0".to_string()).into());
        }

        Ok(())
    }

    pub fn platform(&self, name: &str) -> Option<&PlatformConfig> {
        self.platforms.iter().find(|p| p.name == name)
    }
}

/// Resolve the configuration file path
///
/// `FOP_CONFIG` wins when set; otherwise the platform config directory is
/// used (`~/.config/fop/config.toml` on Linux).
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("FOP_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("fop").join("config.toml"))
}
