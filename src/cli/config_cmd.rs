// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults.
//!
//! These commands read configuration directly from environment variables.

use crate::config::{self, EffectiveConfig, EnvConfig};

/// Print effective config as key-value pairs to stdout.
pub fn run_show() {
    let cfg = config::load().effective_config();
    for line in render(&cfg) {
        println!("{line}");
    }
}

/// Print default config values (no env overrides) to stdout.
pub fn run_defaults() {
    let cfg = EnvConfig::default().effective_config();
    for line in render(&cfg) {
        println!("{line}");
    }
}

fn render(cfg: &EffectiveConfig) -> Vec<String> {
    vec![
        format!("GG_VRAM_BUDGET_MB={}", cfg.budget_mb),
        format!("GG_VRAM_IDLE_THRESHOLD_SECS={}", cfg.idle_threshold_secs),
        format!("GG_VRAM_SWEEP_INTERVAL_SECS={}", cfg.sweep_interval_secs),
        format!("GG_VRAM_LOAD_TIMEOUT_SECS={}", cfg.load_timeout_secs),
        format!("GG_VRAM_LOG_LEVEL={}", cfg.log_level),
        format!("GG_VRAM_LOG_FORMAT={}", cfg.log_format),
    ]
}
