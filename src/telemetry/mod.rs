//! Telemetry module for the model manager.
//!
//! Provides structured logging, spans, and metrics through the `tracing` and
//! `metrics` facades.

mod logging;
mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use metrics::{
    record_budget, record_eviction, record_load, record_load_failure, record_unload_failure,
    EvictionReason,
};
pub use spans::{ModelSpan, SpanExt};
