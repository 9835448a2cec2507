//! Engine configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file,
//! then `SKIRMISH_`-prefixed environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::apply::HealthPolicy;
use crate::battle::DEFAULT_EVENT_CAPACITY;

/// Default tick period in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 500;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SKIRMISH_";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scheduler period; 0 disables the scheduler (manual ticking)
    pub tick_interval_ms: u64,
    /// Stat whose non-positive value incapacitates a combatant
    pub health_stat: String,
    /// Stat that caps healing, when present on a combatant
    pub max_health_stat: String,
    /// Clamp health at zero
    pub clamp_health: bool,
    /// Buffered tick events per subscriber
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let health = HealthPolicy::default();
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            health_stat: health.stat,
            max_health_stat: health.max_stat,
            clamp_health: health.clamp,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Load defaults, then `path` (if given), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()));
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    /// Scheduler period, or `None` for manual ticking
    pub fn tick_interval(&self) -> Option<Duration> {
        (self.tick_interval_ms > 0).then(|| Duration::from_millis(self.tick_interval_ms))
    }

    pub fn health_policy(&self) -> HealthPolicy {
        HealthPolicy {
            stat: self.health_stat.clone(),
            max_stat: self.max_health_stat.clone(),
            clamp: self.clamp_health,
        }
    }
}
