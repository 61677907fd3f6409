use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::{AqiLevel, UnitSystem};

/// Alert thresholds stored alongside the rest of the configuration.
///
/// Example TOML:
/// [alerts]
/// rain = true
/// rain_probability_pct = 70
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Warn when an upcoming day's rain chance reaches the threshold.
    pub rain: bool,
    pub rain_probability_pct: u32,

    /// Warn when the air quality index reaches `aqi_threshold`.
    pub air_quality: bool,
    pub aqi_threshold: AqiLevel,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            rain: true,
            rain_probability_pct: 70,
            air_quality: false,
            aqi_threshold: AqiLevel::Poor,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// OpenWeather API key; every command except `configure` needs one.
    pub api_key: Option<String>,

    /// City used when a command is run without an explicit one.
    pub default_city: Option<String>,

    pub units: UnitSystem,
    pub alerts: AlertConfig,
}

impl Config {
    /// Return the configured API key, or an actionable error.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `skycast configure` first."
            )
        })
    }

    /// Resolve the city to query: an explicit one wins, otherwise the
    /// configured default.
    pub fn city_or_default(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(city) = explicit {
            return Ok(city.to_string());
        }

        self.default_city.clone().ok_or_else(|| {
            anyhow!(
                "No city given and no default city configured.\n\
                 Hint: pass a city name, or run `skycast configure` to set a default."
            )
        })
    }

    /// Load config from disk, or return defaults if no file exists yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skycast", "skycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
