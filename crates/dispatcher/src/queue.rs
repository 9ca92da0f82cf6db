//! 有界并发的分发队列
//!
//! 任务按提交顺序启动，同时运行的数量不超过上限（缺省不限）。失败的任务在预算允许时
//! 重新提交到队尾，否则记录告警后丢弃，错误不会向上抛出。`on_idle` 在所有任务（包括
//! 重新提交的任务）都结束后才返回。

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures::FutureExt;
use notifier_core::{NotifierError, NotifierResult};
use notifier_infrastructure::{MetricsCollector, StructuredLogger};
use tokio::sync::Notify;
use tracing::debug;

use crate::retry::RetryBudget;

#[async_trait]
pub trait QueueJob: Send + Sync + 'static {
    async fn run(&self) -> NotifierResult<()>;

    /// 用于日志的简短描述
    fn describe(&self) -> String;
}

struct QueuedJob {
    job: Arc<dyn QueueJob>,
    resubmissions: u32,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<QueuedJob>,
    running: usize,
}

/// 累计统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed_attempts: u64,
    pub resubmitted: u64,
    pub dropped: u64,
}

#[derive(Default)]
struct StatCounters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed_attempts: AtomicU64,
    resubmitted: AtomicU64,
    dropped: AtomicU64,
}

struct QueueInner {
    state: Mutex<QueueState>,
    concurrency: Option<usize>,
    retry: RetryBudget,
    idle: Notify,
    stats: StatCounters,
    metrics: Option<Arc<MetricsCollector>>,
}

impl QueueInner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_idle(&self) -> bool {
        let state = self.lock();
        state.running == 0 && state.pending.is_empty()
    }

    fn has_capacity(&self, running: usize) -> bool {
        self.concurrency.map_or(true, |limit| running < limit)
    }
}

#[derive(Clone)]
pub struct DispatchQueue {
    inner: Arc<QueueInner>,
}

impl DispatchQueue {
    pub fn new(concurrency: Option<usize>, retry: RetryBudget) -> Self {
        Self::build(concurrency, retry, None)
    }

    pub fn with_metrics(
        concurrency: Option<usize>,
        retry: RetryBudget,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self::build(concurrency, retry, Some(metrics))
    }

    fn build(
        concurrency: Option<usize>,
        retry: RetryBudget,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState::default()),
                concurrency: concurrency.map(|limit| limit.max(1)),
                retry,
                idle: Notify::new(),
                stats: StatCounters::default(),
                metrics,
            }),
        }
    }

    /// 提交任务；必须在tokio运行时内调用
    pub fn submit(&self, job: Arc<dyn QueueJob>) {
        self.inner.stats.submitted.fetch_add(1, Ordering::Relaxed);
        self.inner.lock().pending.push_back(QueuedJob {
            job,
            resubmissions: 0,
        });
        Self::launch_ready(&self.inner);
    }

    /// 等待队列排空；已空闲时立即返回
    pub async fn on_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.inner.is_idle() {
                return;
            }
            notified.await;
        }
    }

    pub fn is_idle(&self) -> bool {
        self.inner.is_idle()
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn running(&self) -> usize {
        self.inner.lock().running
    }

    pub fn stats(&self) -> QueueStats {
        let counters = &self.inner.stats;
        QueueStats {
            submitted: counters.submitted.load(Ordering::Relaxed),
            completed: counters.completed.load(Ordering::Relaxed),
            failed_attempts: counters.failed_attempts.load(Ordering::Relaxed),
            resubmitted: counters.resubmitted.load(Ordering::Relaxed),
            dropped: counters.dropped.load(Ordering::Relaxed),
        }
    }

    fn launch_ready(inner: &Arc<QueueInner>) {
        loop {
            let next = {
                let mut state = inner.lock();
                if !inner.has_capacity(state.running) {
                    None
                } else {
                    let next = state.pending.pop_front();
                    if next.is_some() {
                        state.running += 1;
                    }
                    next
                }
            };

            let Some(queued) = next else {
                break;
            };
            tokio::spawn(Self::run_job(Arc::clone(inner), queued));
        }
    }

    async fn run_job(inner: Arc<QueueInner>, queued: QueuedJob) {
        let outcome = AssertUnwindSafe(queued.job.run())
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(NotifierError::Internal("任务执行时发生panic".to_string())));

        match outcome {
            Ok(()) => {
                inner.stats.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => Self::handle_failure(&inner, queued, err),
        }

        let became_idle = {
            let mut state = inner.lock();
            state.running -= 1;
            state.running == 0 && state.pending.is_empty()
        };

        if became_idle {
            debug!("分发队列已空闲");
            inner.idle.notify_waiters();
        } else {
            Self::launch_ready(&inner);
        }
    }

    // 重新提交的任务在本任务让出运行名额之前入队，等待方不会看到短暂的空闲
    fn handle_failure(inner: &Arc<QueueInner>, queued: QueuedJob, err: NotifierError) {
        inner.stats.failed_attempts.fetch_add(1, Ordering::Relaxed);
        if let Some(metrics) = &inner.metrics {
            metrics.record_dispatch_failure();
        }

        let description = queued.job.describe();
        let error = err.to_string();

        if inner.retry.try_acquire(queued.resubmissions) {
            StructuredLogger::log_dispatch_failure(&description, queued.resubmissions + 1, &error);
            inner.stats.resubmitted.fetch_add(1, Ordering::Relaxed);
            if let Some(metrics) = &inner.metrics {
                metrics.record_retry();
            }
            inner.lock().pending.push_back(QueuedJob {
                job: queued.job,
                resubmissions: queued.resubmissions + 1,
            });
        } else {
            StructuredLogger::log_task_dropped(&description, queued.resubmissions + 1, &error);
            inner.stats.dropped.fetch_add(1, Ordering::Relaxed);
            if let Some(metrics) = &inner.metrics {
                metrics.record_dropped();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifier_config::RetryScope;
    use std::sync::atomic::{AtomicU32, AtomicUsize};
    use std::time::Duration;

    #[derive(Default)]
    struct Probe {
        started: Mutex<Vec<String>>,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    struct ScriptedJob {
        name: String,
        failures_left: AtomicU32,
        attempts: AtomicU32,
        delay: Duration,
        probe: Arc<Probe>,
    }

    impl ScriptedJob {
        fn new(name: &str, failures: u32, probe: &Arc<Probe>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                failures_left: AtomicU32::new(failures),
                attempts: AtomicU32::new(0),
                delay: Duration::from_millis(5),
                probe: Arc::clone(probe),
            })
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueueJob for ScriptedJob {
        async fn run(&self) -> NotifierResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.probe.started.lock().unwrap().push(self.name.clone());
            let now = self.probe.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.probe.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(self.delay).await;
            self.probe.running.fetch_sub(1, Ordering::SeqCst);

            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                if left != u32::MAX {
                    self.failures_left.store(left - 1, Ordering::SeqCst);
                }
                return Err(NotifierError::Delivery(format!("{} failed", self.name)));
            }
            Ok(())
        }

        fn describe(&self) -> String {
            self.name.clone()
        }
    }

    #[tokio::test]
    async fn test_on_idle_returns_immediately_when_empty() {
        let queue = DispatchQueue::new(None, RetryBudget::default());
        tokio::time::timeout(Duration::from_secs(1), queue.on_idle())
            .await
            .expect("idle queue should resolve immediately");
    }

    #[tokio::test]
    async fn test_tasks_start_in_submission_order_under_ceiling() {
        let probe = Arc::new(Probe::default());
        let queue = DispatchQueue::new(Some(1), RetryBudget::default());

        for name in ["a", "b", "c", "d"] {
            queue.submit(ScriptedJob::new(name, 0, &probe));
        }
        queue.on_idle().await;

        assert_eq!(*probe.started.lock().unwrap(), vec!["a", "b", "c", "d"]);
        assert_eq!(probe.peak.load(Ordering::SeqCst), 1);
        assert_eq!(queue.stats().completed, 4);
    }

    #[tokio::test]
    async fn test_concurrency_ceiling_is_respected() {
        let probe = Arc::new(Probe::default());
        let queue = DispatchQueue::new(Some(3), RetryBudget::default());

        for i in 0..12 {
            queue.submit(ScriptedJob::new(&format!("job-{i}"), 0, &probe));
        }
        queue.on_idle().await;

        assert!(probe.peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(queue.stats().completed, 12);
    }

    #[tokio::test]
    async fn test_on_idle_waits_for_resubmissions() {
        let probe = Arc::new(Probe::default());
        let queue = DispatchQueue::new(None, RetryBudget::default());
        let flaky = ScriptedJob::new("flaky", 2, &probe);

        queue.submit(flaky.clone());
        queue.on_idle().await;

        assert_eq!(flaky.attempts(), 3);
        let stats = queue.stats();
        assert_eq!(stats.resubmitted, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.dropped, 0);
        assert!(queue.is_idle());
    }

    #[tokio::test]
    async fn test_always_failing_task_dropped_after_five_resubmissions() {
        let probe = Arc::new(Probe::default());
        let queue = DispatchQueue::new(None, RetryBudget::new(5, RetryScope::PerTask));
        let broken = ScriptedJob::new("broken", u32::MAX, &probe);

        queue.submit(broken.clone());
        queue.on_idle().await;

        // 首次执行 + 5次重新提交
        assert_eq!(broken.attempts(), 6);
        assert_eq!(queue.stats().resubmitted, 5);
        assert_eq!(queue.stats().dropped, 1);
    }

    #[tokio::test]
    async fn test_per_task_budget_not_shared_between_users() {
        let probe = Arc::new(Probe::default());
        let queue = DispatchQueue::new(Some(1), RetryBudget::new(5, RetryScope::PerTask));
        let first = ScriptedJob::new("user-a", u32::MAX, &probe);
        let second = ScriptedJob::new("user-b", 4, &probe);

        queue.submit(first.clone());
        queue.submit(second.clone());
        queue.on_idle().await;

        assert_eq!(first.attempts(), 6);
        assert_eq!(second.attempts(), 5);
        assert_eq!(queue.stats().completed, 1);
        assert_eq!(queue.stats().dropped, 1);
    }

    #[tokio::test]
    async fn test_shared_budget_is_consumed_across_tasks() {
        let probe = Arc::new(Probe::default());
        let queue = DispatchQueue::new(Some(1), RetryBudget::new(2, RetryScope::Shared));
        let first = ScriptedJob::new("user-a", 1, &probe);
        let second = ScriptedJob::new("user-b", u32::MAX, &probe);

        queue.submit(first.clone());
        queue.submit(second.clone());
        queue.on_idle().await;

        // user-a 用掉1次，user-b 只剩1次，第二次失败时被丢弃
        assert_eq!(first.attempts(), 2);
        assert_eq!(second.attempts(), 2);
        assert_eq!(queue.stats().dropped, 1);
    }

    struct PanickingJob;

    #[async_trait]
    impl QueueJob for PanickingJob {
        async fn run(&self) -> NotifierResult<()> {
            panic!("boom");
        }

        fn describe(&self) -> String {
            "panicking".to_string()
        }
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_wedge_the_queue() {
        let queue = DispatchQueue::new(None, RetryBudget::new(1, RetryScope::PerTask));
        queue.submit(Arc::new(PanickingJob));

        tokio::time::timeout(Duration::from_secs(5), queue.on_idle())
            .await
            .expect("queue should become idle");
        assert_eq!(queue.stats().dropped, 1);
    }
}
