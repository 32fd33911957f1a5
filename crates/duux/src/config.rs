//! Configuration file parsing and structures.
//!
//! The `duux` tool reads a TOML file describing logging and where to find
//! the account's device inventory and cached state snapshots.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use strum::IntoStaticStr;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::coordinator::Snapshot;

/// Top-level configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub inventory: Option<InventoryConfig>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[derive(IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,

    /// Per-target levels, e.g. `"duux::preset" = "debug"`
    #[serde(default)]
    pub overrides: HashMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Build the subscriber filter: the base level plus one directive per
    /// override.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        let mut filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from(self.level).into())
            .parse_lossy("");

        for (target, level) in &self.overrides {
            let level: &'static str = (*level).into();
            let directive = format!("{target}={level}")
                .parse()
                .map_err(|e| ConfigError::InvalidOverride(target.clone(), e))?;
            filter = filter.add_directive(directive);
        }

        Ok(filter)
    }
}

/// Where the device inventory and state snapshots live.
///
/// Relative paths are resolved against the config file's directory.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    /// JSON array of device descriptors
    pub devices: PathBuf,

    /// JSON object mapping device address to its state snapshot
    #[serde(default)]
    pub snapshots: Option<PathBuf>,
}

/// Device descriptors and snapshots loaded from disk.
#[derive(Debug, Default)]
pub struct Inventory {
    pub devices: Vec<Value>,
    pub snapshots: HashMap<String, Snapshot>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        let mut config: Config = toml::from_str(&contents).map_err(ConfigError::Parse)?;

        if let (Some(inventory), Some(base)) = (config.inventory.as_mut(), path.parent()) {
            inventory.resolve_relative_to(base);
        }

        Ok(config)
    }
}

impl InventoryConfig {
    fn resolve_relative_to(&mut self, base: &Path) {
        if self.devices.is_relative() {
            self.devices = base.join(&self.devices);
        }
        if let Some(snapshots) = self.snapshots.as_mut().filter(|p| p.is_relative()) {
            *snapshots = base.join(&*snapshots);
        }
    }

    pub fn load(&self) -> Result<Inventory, ConfigError> {
        let devices = read_json(&self.devices)?;
        let snapshots = match &self.snapshots {
            Some(path) => read_json(path)?,
            None => HashMap::new(),
        };

        Ok(Inventory { devices, snapshots })
    }
}

/// Read and deserialize a JSON file.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    serde_json::from_str(&contents).map_err(|e| ConfigError::Json(path.to_path_buf(), e))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse JSON in {0}: {1}")]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("Invalid log override for '{0}': {1}")]
    InvalidOverride(String, #[source] tracing_subscriber::filter::ParseError),
}
