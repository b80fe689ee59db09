use remotebuddy_common::tracing;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::ConfigError;

/// Default location of the daemon configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/remotebuddyd/config.yaml";

/// Daemon configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub daemon: DaemonSettings,
    pub api: ApiSettings,
    pub favorites: FavoritesSettings,
    pub devices: DeviceSettings,
}

/// Daemon-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonSettings {
    pub log_level: String,
}

/// Playback API endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub command_url: String,
    pub favorite_url: String,
    /// How long a best-effort call may run before it is abandoned
    pub send_deadline_ms: u64,
}

/// Favorites file settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoritesSettings {
    pub path: PathBuf,
    /// Window in which bursts of file change notifications collapse into
    /// one reload. 0 reloads once per notification.
    pub coalesce_ms: u64,
}

/// Input device settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub input_dir: PathBuf,
    pub forward_repeats: bool,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            command_url: "http://localhost:3000/api/v1/commands/".to_string(),
            favorite_url: "http://localhost:3000/api/v1/replaceAndPlay".to_string(),
            send_deadline_ms: 250,
        }
    }
}

impl Default for FavoritesSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/home/volumio/favorites.json"),
            coalesce_ms: 150,
        }
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("/dev/input"),
            forward_repeats: false,
        }
    }
}

impl ApiSettings {
    pub fn send_deadline(&self) -> Duration {
        Duration::from_millis(self.send_deadline_ms)
    }
}

impl FavoritesSettings {
    pub fn coalesce_window(&self) -> Duration {
        Duration::from_millis(self.coalesce_ms)
    }
}

impl DaemonSettings {
    /// Parse the configured log level, falling back to INFO
    pub fn level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

/// Load configuration from disk. A missing file yields the defaults.
pub async fn load_config(path: &Path) -> Result<DaemonConfig, ConfigError> {
    info!("Loading configuration from {}", path.display());

    if !path.exists() {
        warn!("Configuration file not found, using defaults");
        return Ok(DaemonConfig::default());
    }

    let content = fs::read_to_string(path).await.map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    debug!("Loaded configuration from disk");
    Ok(config)
}
