use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::{
    acquire::{Source, StationConfig},
    render::{DEFAULT_TEMPLATE, Formatter},
};

pub const DEFAULT_PERIOD_MINUTES: u64 = 15;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// station = "KSFO"
/// template = "$stationPlace$: $tempF$°F"
/// period_minutes = 15
///
/// [source]
/// kind = "report"
/// base_url = "https://tgftp.nws.noaa.gov/data/observations/metar/decoded"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Station code, e.g. "KSFO". Required before anything can be fetched.
    pub station: Option<String>,
    pub template: String,
    pub period_minutes: u64,
    pub source: Source,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            station: None,
            template: DEFAULT_TEMPLATE.to_string(),
            period_minutes: DEFAULT_PERIOD_MINUTES,
            source: Source::default(),
        }
    }
}

impl Config {
    /// The configured station, or a hint on how to set one.
    pub fn station(&self) -> Result<&str> {
        self.station
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No station configured.\n\
                     Hint: run `wxbar configure` (or pass `--station KSFO`) first."
                )
            })
    }

    /// Build the immutable per-cycle configuration.
    pub fn station_config(&self) -> Result<StationConfig> {
        let station = self.station()?;
        Ok(StationConfig::new(station, self.source.clone())
            .with_formatter(Formatter::Template(self.template.clone())))
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxbar", "wxbar")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
