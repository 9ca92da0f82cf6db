//! Structured logging utilities
//!
//! Notable dispatch events with stable `event` field names so log
//! pipelines can filter on them.

use tracing::{debug, info, warn};

/// Structured logging utilities
pub struct StructuredLogger;

impl StructuredLogger {
    /// Log the start of a dispatch cycle
    pub fn log_cycle_started(cycle_id: &str, subscribers: usize, instruments: usize, simulate: bool) {
        info!(
            event = "dispatch_cycle_started",
            cycle.id = cycle_id,
            cycle.subscribers = subscribers,
            cycle.instruments = instruments,
            cycle.simulate = simulate,
            "调度周期开始"
        );
    }

    /// Log the completion of a dispatch cycle
    pub fn log_cycle_completed(
        cycle_id: &str,
        notified: usize,
        not_eligible: usize,
        dropped: usize,
        duration_ms: u64,
    ) {
        info!(
            event = "dispatch_cycle_completed",
            cycle.id = cycle_id,
            cycle.notified = notified,
            cycle.not_eligible = not_eligible,
            cycle.dropped = dropped,
            cycle.duration_ms = duration_ms,
            "调度周期完成"
        );
    }

    /// Log a cycle rejected by the single-flight guard
    pub fn log_cycle_skipped() {
        info!(
            event = "dispatch_cycle_skipped",
            "已有调度周期在运行，本次触发被忽略"
        );
    }

    /// Log a delivered (or simulated) notification
    pub fn log_notification_sent(recipient: &str, held_tranches: usize, simulated: bool) {
        info!(
            event = "notification_sent",
            recipient = recipient,
            notification.held_tranches = held_tranches,
            notification.simulated = simulated,
            "通知已发送"
        );
    }

    /// Log a user who is not eligible for a notification
    pub fn log_not_eligible(recipient: &str, reason: &str) {
        debug!(
            event = "user_not_eligible",
            recipient = recipient,
            reason = reason,
            "用户无需通知"
        );
    }

    /// Log a failed per-user task that will be re-submitted
    pub fn log_dispatch_failure(task: &str, attempt: u32, error: &str) {
        warn!(
            event = "dispatch_failure",
            task = task,
            task.attempt = attempt,
            error = error,
            "用户任务失败，重新提交"
        );
    }

    /// Log a per-user task dropped after exhausting the retry budget
    pub fn log_task_dropped(task: &str, attempts: u32, error: &str) {
        warn!(
            event = "dispatch_task_dropped",
            task = task,
            task.attempts = attempts,
            error = error,
            "重试次数已用尽，放弃该用户任务"
        );
    }
}
