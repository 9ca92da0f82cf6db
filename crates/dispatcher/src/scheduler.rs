use std::sync::Arc;

use chrono::Utc;
use notifier_core::{NotifierResult, SimulationOptions};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::cron_utils::CronScheduler;
use crate::engine::DispatchEngine;

/// 按CRON表达式触发调度周期
///
/// 每次触发都在独立任务中运行；上一个周期尚未结束时，新周期由引擎的单飞保护直接跳过。
pub struct DispatchScheduler {
    engine: Arc<DispatchEngine>,
    cron: CronScheduler,
    run_on_startup: bool,
}

impl DispatchScheduler {
    pub fn new(engine: Arc<DispatchEngine>, schedule: &str, run_on_startup: bool) -> NotifierResult<Self> {
        Ok(Self {
            engine,
            cron: CronScheduler::new(schedule)?,
            run_on_startup,
        })
    }

    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("调度器启动，CRON: {}", self.cron.expression());

        let mut in_flight: Option<JoinHandle<()>> = None;
        if self.run_on_startup {
            in_flight = Some(self.trigger());
        }

        loop {
            let Some(delay) = self.cron.time_until_next_execution(Utc::now()) else {
                warn!("无法计算下一次执行时间，调度器退出");
                break;
            };
            let delay = delay.to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    in_flight = Some(self.trigger());
                }
                _ = shutdown_rx.recv() => {
                    info!("调度器收到关闭信号");
                    break;
                }
            }
        }

        if let Some(handle) = in_flight {
            if !handle.is_finished() {
                info!("等待进行中的调度周期结束");
            }
            if let Err(e) = handle.await {
                error!("调度周期任务异常退出: {}", e);
            }
        }
        info!("调度器已停止");
    }

    fn trigger(&self) -> JoinHandle<()> {
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            match engine.dispatch_cycle(&SimulationOptions::live()).await {
                Ok(report) if report.skipped => {}
                Ok(report) => info!(
                    notified = report.notified,
                    dropped = report.dropped,
                    "定时调度周期完成"
                ),
                Err(e) => error!("定时调度周期失败: {}", e),
            }
        })
    }
}
