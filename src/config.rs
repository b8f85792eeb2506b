//! Runtime configuration loading from environment variables.
//!
//! All configuration values are loaded from `GG_VRAM_*` environment variables
//! with sensible defaults. Invalid values fall back to defaults without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `GG_VRAM_BUDGET_MB` | 8192 | Total accelerator memory budget (MB) |
//! | `GG_VRAM_IDLE_THRESHOLD_SECS` | 300 | Idle time before a model is reaped |
//! | `GG_VRAM_SWEEP_INTERVAL_SECS` | 60 | Idle reaper interval |
//! | `GG_VRAM_LOAD_TIMEOUT_SECS` | 120 | Timeout for `*_with_timeout` calls |
//! | `GG_VRAM_LOG_LEVEL` | info | Tracing filter directive |
//! | `GG_VRAM_LOG_FORMAT` | json | `json` or `pretty` |

use std::time::Duration;

use serde::Serialize;

use crate::manager::{ManagerConfig, ReaperConfig};
use crate::memory::BudgetConfig;
use crate::telemetry::{LogConfig, LogFormat};

pub const DEFAULT_BUDGET_MB: u64 = 8192;
pub const DEFAULT_IDLE_THRESHOLD_SECS: u64 = 300;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 120;

/// Effective configuration summary (serializable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    pub budget_mb: u64,
    pub idle_threshold_secs: u64,
    pub sweep_interval_secs: u64,
    pub load_timeout_secs: u64,
    pub log_level: String,
    pub log_format: String,
}

/// All configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub budget: BudgetConfig,
    pub reaper: ReaperConfig,
    pub load_timeout: Duration,
    pub logging: LogConfig,
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn load_logging() -> LogConfig {
    let level = std::env::var("GG_VRAM_LOG_LEVEL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "info".to_string());
    let format = std::env::var("GG_VRAM_LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse::<LogFormat>().ok())
        .unwrap_or_default();
    LogConfig {
        format,
        level,
        output_path: None,
    }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    let budget_mb = parse_u64("GG_VRAM_BUDGET_MB", DEFAULT_BUDGET_MB).max(1);
    let idle_secs = parse_u64("GG_VRAM_IDLE_THRESHOLD_SECS", DEFAULT_IDLE_THRESHOLD_SECS).max(1);
    let sweep_secs = parse_u64("GG_VRAM_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS).max(1);
    let timeout_secs = parse_u64("GG_VRAM_LOAD_TIMEOUT_SECS", DEFAULT_LOAD_TIMEOUT_SECS).max(1);

    EnvConfig {
        budget: BudgetConfig {
            total_mb: budget_mb,
        },
        reaper: ReaperConfig {
            interval: Duration::from_secs(sweep_secs),
            idle_threshold: Duration::from_secs(idle_secs),
        },
        load_timeout: Duration::from_secs(timeout_secs),
        logging: load_logging(),
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            budget: BudgetConfig {
                total_mb: DEFAULT_BUDGET_MB,
            },
            reaper: ReaperConfig {
                interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
                idle_threshold: Duration::from_secs(DEFAULT_IDLE_THRESHOLD_SECS),
            },
            load_timeout: Duration::from_secs(DEFAULT_LOAD_TIMEOUT_SECS),
            logging: LogConfig::default(),
        }
    }
}

impl EnvConfig {
    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            budget: self.budget.clone(),
        }
    }

    /// Return a serializable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            budget_mb: self.budget.total_mb,
            idle_threshold_secs: self.reaper.idle_threshold.as_secs(),
            sweep_interval_secs: self.reaper.interval.as_secs(),
            load_timeout_secs: self.load_timeout.as_secs(),
            log_level: self.logging.level.clone(),
            log_format: match self.logging.format {
                LogFormat::Json => "json".to_string(),
                LogFormat::Pretty => "pretty".to_string(),
            },
        }
    }
}
