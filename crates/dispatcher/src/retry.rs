use std::sync::atomic::{AtomicU32, Ordering};

use notifier_config::{RetryConfig, RetryScope};

/// 失败任务的重新提交预算
///
/// `PerTask` 只看任务自身已重新提交的次数；`Shared` 在整个队列上共用一个计数器，
/// 计数器达到上限的那次失败会把它清零，任务被丢弃。
#[derive(Debug)]
pub struct RetryBudget {
    max_resubmissions: u32,
    scope: RetryScope,
    shared_counter: AtomicU32,
}

impl RetryBudget {
    pub fn new(max_resubmissions: u32, scope: RetryScope) -> Self {
        Self {
            max_resubmissions,
            scope,
            shared_counter: AtomicU32::new(0),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_resubmissions, config.scope)
    }

    pub fn max_resubmissions(&self) -> u32 {
        self.max_resubmissions
    }

    pub fn scope(&self) -> RetryScope {
        self.scope
    }

    /// `resubmissions` 是该任务已经被重新提交的次数
    pub fn try_acquire(&self, resubmissions: u32) -> bool {
        match self.scope {
            RetryScope::PerTask => resubmissions < self.max_resubmissions,
            RetryScope::Shared => {
                let acquired = self
                    .shared_counter
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                        (count < self.max_resubmissions).then_some(count + 1)
                    })
                    .is_ok();
                if !acquired {
                    self.shared_counter.store(0, Ordering::Release);
                }
                acquired
            }
        }
    }

    pub fn shared_count(&self) -> u32 {
        self.shared_counter.load(Ordering::Acquire)
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
