use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

const CONFIG_FILE: &str = ".tfs-pulse.toml";
const TOKEN_ENV: &str = "TFS_PULSE_TOKEN";
const USER_ID_ENV: &str = "TFS_PULSE_USER_ID";

/// Polling more often than this only hammers the server.
pub const MIN_POLL_INTERVAL_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .tfs-pulse.toml.
/// All fields are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Personal access token. If None, falls back to TFS_PULSE_TOKEN.
    pub token: Option<String>,
    /// Identity whose pull requests are tracked. Looked up from the server
    /// when neither this nor TFS_PULSE_USER_ID is set.
    pub user_id: Option<String>,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            token: None,
            user_id: None,
            api_version: "3.0".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_secs: 300 }
    }
}

impl PollingConfig {
    /// Configured interval, clamped to the minimum.
    pub fn effective_interval_secs(&self) -> u64 {
        self.interval_secs.max(MIN_POLL_INTERVAL_SECS)
    }
}

impl Config {
    /// Load configuration from .tfs-pulse.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Config file value takes precedence, falls back to TFS_PULSE_TOKEN.
    pub fn token(&self) -> Option<String> {
        self.server
            .token
            .clone()
            .or_else(|| std::env::var(TOKEN_ENV).ok())
            .filter(|token| !token.is_empty())
    }

    /// Config file value takes precedence, falls back to TFS_PULSE_USER_ID.
    pub fn user_id(&self) -> Option<String> {
        self.server
            .user_id
            .clone()
            .or_else(|| std::env::var(USER_ID_ENV).ok())
            .filter(|id| !id.is_empty())
    }
}
