use std::path::Path;
use std::time::Duration;

use godfield_core::vocabulary::Vocabulary;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decision service endpoint used when none is given.
pub const DEFAULT_DECIDE_URL: &str = "http://127.0.0.1:8000/decide";
/// Scene bridge base URL used when none is given.
pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:8765";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Settle delays and cadences, all in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Timings {
    /// Always-on tick.
    pub base_tick_ms: u64,
    /// Tick while a defense burst is active.
    pub burst_tick_ms: u64,
    /// Quiet period held after every action before the lock frees.
    pub lock_quiet_ms: u64,
    pub card_settle_ms: u64,
    pub commit_settle_ms: u64,
    pub pass_settle_ms: u64,
    pub trade_step_ms: u64,
    pub exchange_open_ms: u64,
    pub exchange_adjust_ms: u64,
    pub confirm_settle_ms: u64,
    pub poll_ms: u64,
    pub confirm_attempts: u32,
    pub counter_attempts: u32,
    pub inspect_open_ms: u64,
    pub inspect_close_ms: u64,
    pub inspection_interval_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            base_tick_ms: 1_000,
            burst_tick_ms: 250,
            lock_quiet_ms: 500,
            card_settle_ms: 400,
            commit_settle_ms: 800,
            pass_settle_ms: 500,
            trade_step_ms: 300,
            exchange_open_ms: 600,
            exchange_adjust_ms: 400,
            confirm_settle_ms: 500,
            poll_ms: 200,
            confirm_attempts: 15,
            counter_attempts: 20,
            inspect_open_ms: 600,
            inspect_close_ms: 400,
            inspection_interval_ms: 20_000,
        }
    }
}

impl Timings {
    /// Cadence of the always-on tick.
    pub fn base_tick(&self) -> Duration {
        Duration::from_millis(self.base_tick_ms)
    }

    /// Cadence of the defense burst tick.
    pub fn burst_tick(&self) -> Duration {
        Duration::from_millis(self.burst_tick_ms)
    }
}

/// Optional TOML overrides, e.g.
///
/// ```toml
/// [timings]
/// commit_settle_ms = 1000
///
/// [vocabulary]
/// sale = ["売る"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub timings: Timings,
    pub vocabulary: Vocabulary,
}

impl FileConfig {
    /// Read and parse `path`. Missing keys keep their defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&s).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Everything an [`crate::Agent`] is built from.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// `POST` target for decide requests.
    pub decide_url: String,
    pub bridge_url: String,
    /// Log input instead of sending it.
    pub dry_run: bool,
    pub timings: Timings,
    pub vocabulary: Vocabulary,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            decide_url: DEFAULT_DECIDE_URL.to_string(),
            bridge_url: DEFAULT_BRIDGE_URL.to_string(),
            dry_run: false,
            timings: Timings::default(),
            vocabulary: Vocabulary::default(),
        }
    }
}
