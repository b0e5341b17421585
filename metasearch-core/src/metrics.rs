//! Per-engine outcome reporting.
//!
//! The dispatcher reports every settled engine call to a [`MetricsSink`].
//! Sinks are fire-and-forget: they must not block and cannot fail the
//! search.

use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::SearchError;

/// Receiver of per-engine outcomes.
pub trait MetricsSink: Send + Sync {
    /// An engine answered with `result_count` results after `elapsed`.
    fn record_success(&self, engine: &str, result_count: usize, elapsed: Duration);

    /// An engine failed.
    fn record_error(&self, engine: &str, error: &SearchError);
}

/// Emits outcomes as `tracing` events under the `metasearch::metrics` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn record_success(&self, engine: &str, result_count: usize, elapsed: Duration) {
        tracing::info!(
            target: "metasearch::metrics",
            engine,
            result_count,
            elapsed_secs = elapsed.as_secs_f64(),
            "engine succeeded"
        );
    }

    fn record_error(&self, engine: &str, error: &SearchError) {
        tracing::info!(target: "metasearch::metrics", engine, error = %error, "engine failed");
    }
}

/// One reported outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricEvent {
    /// Successful engine call.
    Success {
        /// Engine name.
        engine: String,
        /// Number of parsed results.
        result_count: usize,
        /// Wall time of the call, including the wait for a connection slot.
        elapsed: Duration,
    },
    /// Failed engine call.
    Error {
        /// Engine name.
        engine: String,
        /// Rendered error.
        description: String,
    },
}

/// Forwards outcomes over a bounded channel, e.g. to a persistence task.
///
/// Events are dropped when the channel is full or closed.
#[derive(Debug, Clone)]
pub struct ChannelMetrics {
    tx: mpsc::Sender<MetricEvent>,
}

impl ChannelMetrics {
    /// Create a sink and the receiver that drains it.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<MetricEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    fn send(&self, event: MetricEvent) {
        if let Err(e) = self.tx.try_send(event) {
            tracing::trace!(error = %e, "metric event dropped");
        }
    }
}

impl MetricsSink for ChannelMetrics {
    fn record_success(&self, engine: &str, result_count: usize, elapsed: Duration) {
        self.send(MetricEvent::Success {
            engine: engine.to_string(),
            result_count,
            elapsed,
        });
    }

    fn record_error(&self, engine: &str, error: &SearchError) {
        self.send(MetricEvent::Error {
            engine: engine.to_string(),
            description: error.to_string(),
        });
    }
}
