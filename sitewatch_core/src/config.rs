//! Configuration for the activity feed, its server and its clients.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working setup.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::activity::DEFAULT_CAPACITY;
use crate::error::ConfigError;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteWatchConfig {
    pub feed: FeedConfig,
    pub server: ServerConfig,
}

/// Client-side feed settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Maximum number of records retained.
    pub capacity: usize,

    /// Whether to start from the historical sample.
    pub seed_history: bool,

    pub reconnect: ReconnectConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            seed_history: true,
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// Backoff applied after the push channel drops.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub enabled: bool,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    /// Consecutive failed attempts before giving up. Zero retries forever.
    pub max_attempts: u32,
    pub jitter: bool,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            max_attempts: 10,
            jitter: true,
        }
    }
}

impl ReconnectConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// No retries at all.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Feed server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,

    /// Slots in the broadcast channel feeding SSE subscribers.
    pub broadcast_capacity: usize,

    pub keep_alive_secs: u64,

    pub keep_alive_text: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            broadcast_capacity: 100,
            keep_alive_secs: 15,
            keep_alive_text: "keep-alive".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

impl SiteWatchConfig {
    /// Loads and validates a TOML file, or returns the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.capacity == 0 {
            return Err(ConfigError::Invalid("feed.capacity must be at least 1".into()));
        }
        if self.server.broadcast_capacity == 0 {
            return Err(ConfigError::Invalid(
                "server.broadcast_capacity must be at least 1".into(),
            ));
        }
        let reconnect = &self.feed.reconnect;
        if reconnect.multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "feed.reconnect.multiplier must be >= 1.0".into(),
            ));
        }
        if reconnect.max_delay_ms < reconnect.base_delay_ms {
            return Err(ConfigError::Invalid(
                "feed.reconnect.max_delay_ms must not be below base_delay_ms".into(),
            ));
        }
        Ok(())
    }
}
