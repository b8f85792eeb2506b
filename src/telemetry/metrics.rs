//! Metrics emitted through the `metrics` facade.
//!
//! No recorder is installed here; the embedding process chooses an exporter.

use std::time::Duration;

use crate::models::PriorityClass;

/// Why a resident model was unloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    Budget,
    Idle,
    Explicit,
}

impl EvictionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Idle => "idle",
            Self::Explicit => "explicit",
        }
    }
}

/// Publish budget gauges after any table mutation.
pub fn record_budget(committed_mb: u64, utilization_percent: f64, resident: usize) {
    metrics::gauge!("gg_vram_committed_mb").set(committed_mb as f64);
    metrics::gauge!("gg_vram_utilization_percent").set(utilization_percent);
    metrics::gauge!("gg_vram_resident_models").set(resident as f64);
}

pub fn record_eviction(model_id: &str, priority: PriorityClass, reason: EvictionReason) {
    metrics::counter!(
        "gg_vram_evictions_total",
        "model_id" => model_id.to_string(),
        "priority" => priority.as_str(),
        "reason" => reason.as_str()
    )
    .increment(1);
}

pub fn record_load(model_id: &str, elapsed: Duration) {
    metrics::histogram!("gg_vram_load_duration_seconds", "model_id" => model_id.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_load_failure(model_id: &str) {
    metrics::counter!("gg_vram_load_failures_total", "model_id" => model_id.to_string())
        .increment(1);
}

pub fn record_unload_failure(model_id: &str) {
    metrics::counter!("gg_vram_unload_failures_total", "model_id" => model_id.to_string())
        .increment(1);
}
