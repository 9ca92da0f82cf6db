//! 到期分级通知的分发引擎
//!
//! 自底向上：`TrancheCatalog` 拉取并过滤到期分级，`BalanceAggregator` 探测单个分级的
//! 代币余额，`TrancheEvaluator` 对单个用户并发评估，`DispatchQueue` 以有界并发运行
//! 每个用户的任务并负责重试，`NotificationFormatter` 渲染通知正文，
//! `DispatchEngine` 编排完整周期。

pub mod balance;
pub mod catalog;
pub mod cron_utils;
pub mod engine;
pub mod evaluator;
pub mod formatter;
pub mod queue;
pub mod retry;
pub mod scheduler;

pub use balance::BalanceAggregator;
pub use catalog::TrancheCatalog;
pub use cron_utils::CronScheduler;
pub use engine::{CycleReport, DispatchEngine, EngineDependencies};
pub use evaluator::TrancheEvaluator;
pub use formatter::NotificationFormatter;
pub use queue::{DispatchQueue, QueueJob, QueueStats};
pub use retry::RetryBudget;
pub use scheduler::DispatchScheduler;
