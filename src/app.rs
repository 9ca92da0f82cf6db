use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use notifier_api::create_app;
use notifier_config::AppConfig;
use notifier_core::SimulationOptions;
use notifier_dispatcher::{CycleReport, DispatchEngine, DispatchScheduler, EngineDependencies};
use notifier_infrastructure::{
    AlloyTokenContracts, HttpDeliveryGateway, HttpRegistrySource, MetricsCollector,
    RotatingWalletProvider,
};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info};

/// 主应用程序
pub struct Application {
    config: AppConfig,
    engine: Arc<DispatchEngine>,
    prometheus: Option<PrometheusHandle>,
}

impl Application {
    /// 按配置装配所有外部依赖
    pub fn new(config: AppConfig) -> Result<Self> {
        info!("初始化应用程序");

        // 指标句柄在创建时绑定全局recorder，必须先安装
        let prometheus = if config.observability.metrics_enabled {
            Some(
                PrometheusBuilder::new()
                    .install_recorder()
                    .context("安装Prometheus指标导出器失败")?,
            )
        } else {
            None
        };
        let metrics = Arc::new(MetricsCollector::new());

        let registry =
            HttpRegistrySource::new(&config.registry).context("创建注册表客户端失败")?;
        let contracts = AlloyTokenContracts::from_config(&config.chain)
            .context("创建链上合约访问器失败")?
            .with_metrics(Arc::clone(&metrics));
        let delivery =
            HttpDeliveryGateway::new(&config.delivery).context("创建投递网关客户端失败")?;
        let wallets =
            RotatingWalletProvider::from_config(&config.wallets).context("加载频道钱包失败")?;

        let deps = EngineDependencies {
            registry: Arc::new(registry),
            contracts: Arc::new(contracts),
            delivery: Arc::new(delivery),
            wallets: Arc::new(wallets),
        };
        let engine = Arc::new(DispatchEngine::new(deps, &config, metrics));

        Ok(Self {
            config,
            engine,
            prometheus,
        })
    }

    /// 运行单个调度周期后返回
    pub async fn run_once(&self, simulate: bool) -> Result<CycleReport> {
        let options = if simulate {
            SimulationOptions::simulated()
        } else {
            SimulationOptions::live()
        };

        self.engine
            .dispatch_cycle(&options)
            .await
            .context("调度周期失败")
    }

    /// 运行定时调度与API服务器，直到收到关闭信号
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let mut handles = Vec::new();

        if self.config.dispatcher.enabled {
            let scheduler = DispatchScheduler::new(
                Arc::clone(&self.engine),
                &self.config.dispatcher.schedule,
                self.config.dispatcher.run_on_startup,
            )
            .context("创建调度器失败")?;
            handles.push(tokio::spawn(scheduler.run(shutdown_rx.resubscribe())));
        } else {
            info!("定时调度已禁用");
        }

        if self.config.api.enabled {
            let listener = TcpListener::bind(&self.config.api.bind_address)
                .await
                .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;
            info!("API服务器启动在 http://{}", self.config.api.bind_address);

            let app = create_app(
                Arc::clone(&self.engine),
                self.prometheus.clone(),
                &self.config.api,
            );
            let mut api_shutdown = shutdown_rx.resubscribe();
            handles.push(tokio::spawn(async move {
                let server = axum::serve(
                    listener,
                    app.into_make_service_with_connect_info::<SocketAddr>(),
                )
                .with_graceful_shutdown(async move {
                    let _ = api_shutdown.recv().await;
                });
                if let Err(e) = server.await {
                    error!("API服务器运行失败: {}", e);
                }
                info!("API服务器已停止");
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("组件任务异常退出: {}", e);
            }
        }

        info!("所有组件已停止");
        Ok(())
    }
}
