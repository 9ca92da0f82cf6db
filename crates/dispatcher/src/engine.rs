//! 调度周期编排
//!
//! 状态机 `Idle -> Running -> Idle`：同一时间只有一个周期在运行，并发触发直接返回。
//! 一个周期依次获取频道凭证、订阅者列表与到期分级，为每个订阅者提交一个
//! 评估并通知的任务，然后等待队列排空。

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use notifier_config::{AppConfig, NotificationConfig};
use notifier_core::{
    Address, DeliveryGateway, Instrument, Notification, NotifierError, NotifierResult,
    RegistrySource, SigningCredential, SimulationOptions, TokenContractFactory,
    TrancheEvaluationResult, UserDispatchOutcome, WalletProvider,
};
use notifier_infrastructure::{MetricsCollector, StructuredLogger};
use serde::Serialize;
use tracing::{debug, info, info_span, Instrument as _};
use uuid::Uuid;

use crate::balance::BalanceAggregator;
use crate::catalog::TrancheCatalog;
use crate::evaluator::TrancheEvaluator;
use crate::formatter::NotificationFormatter;
use crate::queue::{DispatchQueue, QueueJob};
use crate::retry::RetryBudget;

const STATE_IDLE: u8 = 0;
const STATE_RUNNING: u8 = 1;

/// 引擎依赖的外部能力
#[derive(Clone)]
pub struct EngineDependencies {
    pub registry: Arc<dyn RegistrySource>,
    pub contracts: Arc<dyn TokenContractFactory>,
    pub delivery: Arc<dyn DeliveryGateway>,
    pub wallets: Arc<dyn WalletProvider>,
}

/// 一次调度周期的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub cycle_id: Option<String>,
    pub skipped: bool,
    pub subscribers: usize,
    pub instruments: usize,
    pub notified: usize,
    pub not_eligible: usize,
    pub dropped: usize,
    pub duration_ms: u64,
}

impl CycleReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct CycleCounters {
    notified: AtomicUsize,
    not_eligible: AtomicUsize,
}

/// 同一周期内所有用户任务共享的上下文
struct CycleContext {
    credential: SigningCredential,
    instruments: Vec<Instrument>,
    options: SimulationOptions,
    evaluator: TrancheEvaluator,
    formatter: NotificationFormatter,
    delivery: Arc<dyn DeliveryGateway>,
    notification: NotificationConfig,
    counters: CycleCounters,
    metrics: Arc<MetricsCollector>,
}

/// 单个订阅者的评估并通知任务
struct NotifyUserJob {
    user: Address,
    context: Arc<CycleContext>,
}

#[async_trait]
impl QueueJob for NotifyUserJob {
    async fn run(&self) -> NotifierResult<()> {
        let ctx = &self.context;
        let outcome = ctx
            .evaluator
            .evaluate_user(
                self.user,
                &ctx.instruments,
                ctx.credential.channel_address(),
                ctx.options.override_network.as_ref(),
            )
            .await?;

        if !outcome.success {
            ctx.counters.not_eligible.fetch_add(1, Ordering::Relaxed);
            StructuredLogger::log_not_eligible(
                &self.user.to_string(),
                outcome.reason.as_deref().unwrap_or_default(),
            );
            return Ok(());
        }

        let notification = Notification {
            recipient: self.user,
            title: ctx.notification.title.clone(),
            message: ctx.notification.message.clone(),
            payload_title: ctx.notification.payload_title.clone(),
            payload_body: ctx.formatter.format(&outcome.held_tranches),
            category: ctx.notification.category,
            simulate: ctx.options.simulate,
        };

        let receipt = ctx
            .delivery
            .send_notification(&ctx.credential, &notification)
            .await?;

        ctx.counters.notified.fetch_add(1, Ordering::Relaxed);
        ctx.metrics.record_notification_sent();
        StructuredLogger::log_notification_sent(
            &self.user.to_string(),
            outcome.held_tranches.len(),
            receipt.simulated,
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("notify_user:{}", self.user)
    }
}

// 周期任务结束时把状态恢复为空闲，出错返回或异常退出时同样生效
struct RunningGuard(Arc<EngineCore>);

impl RunningGuard {
    fn acquire(core: &Arc<EngineCore>) -> Option<Self> {
        core.state
            .compare_exchange(
                STATE_IDLE,
                STATE_RUNNING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .ok()
            .map(|_| RunningGuard(Arc::clone(core)))
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.state.store(STATE_IDLE, Ordering::Release);
    }
}

struct EngineCore {
    channel_id: String,
    catalog: TrancheCatalog,
    evaluator: TrancheEvaluator,
    formatter: NotificationFormatter,
    notification: NotificationConfig,
    delivery: Arc<dyn DeliveryGateway>,
    wallets: Arc<dyn WalletProvider>,
    queue: DispatchQueue,
    state: AtomicU8,
    metrics: Arc<MetricsCollector>,
}

/// 调度引擎
///
/// 周期主体运行在独立任务中并持有运行状态，调用方放弃等待不会提前结束周期，
/// 也不会让下一次触发与仍在进行的周期重叠。
pub struct DispatchEngine {
    core: Arc<EngineCore>,
}

impl DispatchEngine {
    pub fn new(deps: EngineDependencies, config: &AppConfig, metrics: Arc<MetricsCollector>) -> Self {
        let evaluator = TrancheEvaluator::new(
            BalanceAggregator::new(deps.contracts),
            config.dispatcher.max_concurrent_probes,
        );
        let queue = DispatchQueue::with_metrics(
            config.dispatcher.max_concurrent_users,
            RetryBudget::from_config(&config.dispatcher.retry),
            Arc::clone(&metrics),
        );

        let core = EngineCore {
            channel_id: config.wallets.channel_id.clone(),
            catalog: TrancheCatalog::new(deps.registry),
            evaluator,
            formatter: NotificationFormatter::from_config(&config.notification),
            notification: config.notification.clone(),
            delivery: deps.delivery,
            wallets: deps.wallets,
            queue,
            state: AtomicU8::new(STATE_IDLE),
            metrics,
        };
        Self {
            core: Arc::new(core),
        }
    }

    pub fn is_running(&self) -> bool {
        self.core.state.load(Ordering::Acquire) == STATE_RUNNING
    }

    /// 运行一个完整的调度周期；已有周期在运行时立即返回 `skipped`
    pub async fn dispatch_cycle(&self, options: &SimulationOptions) -> NotifierResult<CycleReport> {
        let Some(guard) = RunningGuard::acquire(&self.core) else {
            StructuredLogger::log_cycle_skipped();
            self.core.metrics.record_cycle_skipped();
            return Ok(CycleReport::skipped());
        };

        let cycle_id = Uuid::new_v4().to_string();
        let span = info_span!("dispatch_cycle", cycle_id = %cycle_id);
        let core = Arc::clone(&self.core);
        let options = options.clone();

        let handle = tokio::spawn(
            async move {
                let _guard = guard;
                core.run_cycle(cycle_id, &options).await
            }
            .instrument(span),
        );

        handle
            .await
            .map_err(|e| NotifierError::Internal(format!("调度周期任务异常退出: {e}")))?
    }

    /// 当前已到期的分级
    pub async fn list_expired_instruments(&self) -> NotifierResult<Vec<Instrument>> {
        self.core.catalog.list_expired_instruments().await
    }

    /// 评估单个用户的全部到期分级，不发送通知
    pub async fn check_user_tranches(
        &self,
        user: Option<Address>,
        options: &SimulationOptions,
    ) -> NotifierResult<UserDispatchOutcome> {
        let user = Self::require_user(user, options)?;
        let credential = self
            .core
            .wallets
            .signing_credential(&self.core.channel_id)
            .await?;
        let instruments = self.core.catalog.list_expired_instruments().await?;

        self.core
            .evaluator
            .evaluate_user(
                user,
                &instruments,
                credential.channel_address(),
                options.override_network.as_ref(),
            )
            .await
    }

    /// 评估单个用户在到期列表中第 `index` 个分级上的持仓
    pub async fn check_tranche(
        &self,
        user: Option<Address>,
        index: usize,
        options: &SimulationOptions,
    ) -> NotifierResult<TrancheEvaluationResult> {
        let user = Self::require_user(user, options)?;
        let instruments = self.core.catalog.list_expired_instruments().await?;
        let instrument = instruments.get(index).ok_or_else(|| {
            NotifierError::InvalidArgument(format!(
                "分级下标 {index} 超出范围（共 {} 个）",
                instruments.len()
            ))
        })?;

        self.core
            .evaluator
            .check_tranche(user, instrument, options.override_network.as_ref())
            .await
    }

    fn require_user(user: Option<Address>, options: &SimulationOptions) -> NotifierResult<Address> {
        options
            .resolve_target(user)
            .ok_or_else(|| NotifierError::InvalidArgument("缺少用户地址".to_string()))
    }
}

impl EngineCore {
    async fn run_cycle(
        &self,
        cycle_id: String,
        options: &SimulationOptions,
    ) -> NotifierResult<CycleReport> {
        let started = Instant::now();

        let credential = self.wallets.signing_credential(&self.channel_id).await?;
        let mut subscribers = self.delivery.list_subscribers(&credential).await?;
        let instruments = self.catalog.list_expired_instruments().await?;

        if subscribers.is_empty() {
            if let Some(target) = options.resolve_target(None) {
                info!(target = %target, "订阅者为空，使用覆盖地址");
                subscribers.push(target);
            }
        }

        StructuredLogger::log_cycle_started(
            &cycle_id,
            subscribers.len(),
            instruments.len(),
            options.simulate,
        );

        let context = Arc::new(CycleContext {
            credential,
            instruments,
            options: options.clone(),
            evaluator: self.evaluator.clone(),
            formatter: self.formatter.clone(),
            delivery: Arc::clone(&self.delivery),
            notification: self.notification.clone(),
            counters: CycleCounters::default(),
            metrics: Arc::clone(&self.metrics),
        });

        let before = self.queue.stats();
        for user in &subscribers {
            self.queue.submit(Arc::new(NotifyUserJob {
                user: *user,
                context: Arc::clone(&context),
            }));
            debug!(user = %user, "已提交用户任务");
        }
        self.queue.on_idle().await;
        let after = self.queue.stats();

        let report = CycleReport {
            cycle_id: Some(cycle_id),
            skipped: false,
            subscribers: subscribers.len(),
            instruments: context.instruments.len(),
            notified: context.counters.notified.load(Ordering::Relaxed),
            not_eligible: context.counters.not_eligible.load(Ordering::Relaxed),
            dropped: (after.dropped - before.dropped) as usize,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        self.metrics.record_cycle(
            report.subscribers,
            report.instruments,
            started.elapsed().as_secs_f64(),
        );
        StructuredLogger::log_cycle_completed(
            report.cycle_id.as_deref().unwrap_or_default(),
            report.notified,
            report.not_eligible,
            report.dropped,
            report.duration_ms,
        );
        Ok(report)
    }
}
