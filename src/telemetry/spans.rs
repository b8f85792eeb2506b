//! Span utilities and extension traits for model manager tracing.
//!
//! Provides standardized span creation and result recording.

use std::time::Duration;

use tracing::{info_span, Span};

/// Records model request outcomes onto a span created by [`ModelSpan`].
pub trait SpanExt {
    /// Fill `status`, plus `error.message` on failure.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;

    /// Number of residents evicted to make room for this request.
    fn record_evicted(&self, count: usize);

    /// Adapter load latency, in whole milliseconds.
    fn record_load(&self, elapsed: Duration);
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        if let Err(e) = result {
            self.record("status", "error");
            self.record("error.message", e.to_string().as_str());
        } else {
            self.record("status", "ok");
        }
    }

    fn record_evicted(&self, count: usize) {
        self.record("evicted", count as u64);
    }

    fn record_load(&self, elapsed: Duration) {
        self.record("load_ms", elapsed.as_millis() as u64);
    }
}

/// Factory for model request spans.
pub struct ModelSpan;

impl ModelSpan {
    /// Create a span for a fetch or acquire call.
    ///
    /// Fields included:
    /// - `op`: `fetch` or `acquire`
    /// - `model_id`: Model being requested
    /// - `status`: To be filled in by `SpanExt::record_result`
    /// - `error.message`: To be filled in on error
    /// - `evicted`: Number of models evicted to make room
    /// - `load_ms`: Load latency when a load happened
    pub fn new(op: &'static str, model_id: &str) -> Span {
        info_span!(
            "model_request",
            op = op,
            model_id = %model_id,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
            evicted = tracing::field::Empty,
            load_ms = tracing::field::Empty,
        )
    }
}
