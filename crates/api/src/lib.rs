//! # Notifier API
//!
//! 到期分级通知服务的HTTP接口，基于Axum构建。
//!
//! ## API 端点
//!
//! 以下端点挂载在 `/showrunners/element_tracker` 下，均为 `POST` 并接收JSON请求体：
//! - `/send_message` - 运行一次完整的调度周期
//! - `/get_expired_tranches_array` - 列出已到期的分级
//! - `/check_user_tranches` - 评估单个用户的全部到期分级（`user` 可选）
//! - `/check_tranche` - 评估单个用户在某个到期分级上的持仓（`user`、`tranche`）
//!
//! 每个请求体都可以携带 `simulate`，取值为布尔值或
//! `{"logicOverride": {"mode": true, "applyToAddr": "0x..", "network": "mainnet"}}`。
//! 成功时返回 `201` 与 `{"result": ...}`。
//!
//! `api.local_only` 开启时，上述端点只接受回环地址的调用，其他来源返回 `403`。
//!
//! ### 系统端点
//! - `GET /health` - 健康检查
//! - `GET /metrics` - Prometheus指标（启用指标时）
//!
//! ## 错误响应
//!
//! ```json
//! {
//!   "error": {
//!     "message": "无效的参数: 缺少用户地址",
//!     "type": "INVALID_ARGUMENT",
//!     "code": 400,
//!     "timestamp": "2024-01-01T00:00:00Z"
//!   }
//! }
//! ```
//!
//! 服务器需要以 `into_make_service_with_connect_info::<SocketAddr>()` 启动，
//! 否则来源地址检查无法取得对端地址。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod types;

use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use notifier_config::ApiConfig;
use notifier_dispatcher::DispatchEngine;
use std::sync::Arc;
use tower::ServiceBuilder;

use middleware::{cors_layer, request_logging, trace_layer};
use routes::{create_routes, AppState};

/// 创建完整的API应用
pub fn create_app(
    engine: Arc<DispatchEngine>,
    prometheus: Option<PrometheusHandle>,
    api_config: &ApiConfig,
) -> Router {
    let state = AppState {
        engine,
        prometheus,
        local_only: api_config.local_only,
    };

    create_routes(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(cors_layer())
            .layer(axum::middleware::from_fn(request_logging)),
    )
}
