//! Metrics collector for the tranche notifier
//!
//! Handles are registered against whatever global `metrics` recorder is
//! installed; without one every call is a no-op.

use metrics::{counter, gauge, histogram, Counter, Gauge, Histogram};
use tracing::debug;

/// Metrics collector for dispatch cycles and notification delivery
pub struct MetricsCollector {
    // Cycle metrics
    dispatch_cycles_total: Counter,
    dispatch_cycles_skipped_total: Counter,
    dispatch_cycle_duration: Histogram,
    subscribers: Gauge,
    expired_instruments: Gauge,

    // Per-user task metrics
    notifications_sent_total: Counter,
    dispatch_failures_total: Counter,
    dispatch_retries_total: Counter,
    dispatch_dropped_total: Counter,

    // Chain reads
    balance_probes_total: Counter,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            dispatch_cycles_total: counter!("notifier_dispatch_cycles_total"),
            dispatch_cycles_skipped_total: counter!("notifier_dispatch_cycles_skipped_total"),
            dispatch_cycle_duration: histogram!("notifier_dispatch_cycle_duration_seconds"),
            subscribers: gauge!("notifier_subscribers"),
            expired_instruments: gauge!("notifier_expired_instruments"),
            notifications_sent_total: counter!("notifier_notifications_sent_total"),
            dispatch_failures_total: counter!("notifier_dispatch_failures_total"),
            dispatch_retries_total: counter!("notifier_dispatch_retries_total"),
            dispatch_dropped_total: counter!("notifier_dispatch_dropped_total"),
            balance_probes_total: counter!("notifier_balance_probes_total"),
        }
    }

    /// Record a completed dispatch cycle
    pub fn record_cycle(&self, subscribers: usize, instruments: usize, duration_seconds: f64) {
        self.dispatch_cycles_total.increment(1);
        self.dispatch_cycle_duration.record(duration_seconds);
        self.subscribers.set(subscribers as f64);
        self.expired_instruments.set(instruments as f64);

        debug!(
            subscribers = subscribers,
            instruments = instruments,
            duration_seconds = duration_seconds,
            "Dispatch cycle recorded"
        );
    }

    /// Record a cycle rejected by the single-flight guard
    pub fn record_cycle_skipped(&self) {
        self.dispatch_cycles_skipped_total.increment(1);
    }

    pub fn record_notification_sent(&self) {
        self.notifications_sent_total.increment(1);
    }

    pub fn record_dispatch_failure(&self) {
        self.dispatch_failures_total.increment(1);
    }

    pub fn record_retry(&self) {
        self.dispatch_retries_total.increment(1);
    }

    pub fn record_dropped(&self) {
        self.dispatch_dropped_total.increment(1);
    }

    pub fn record_balance_probe(&self) {
        self.balance_probes_total.increment(1);
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_without_recorder_are_noops() {
        let metrics = MetricsCollector::new();
        metrics.record_cycle(2, 1, 0.25);
        metrics.record_cycle_skipped();
        metrics.record_notification_sent();
        metrics.record_dispatch_failure();
        metrics.record_retry();
        metrics.record_dropped();
        metrics.record_balance_probe();
    }
}
