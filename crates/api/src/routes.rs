use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use notifier_dispatcher::DispatchEngine;
use std::sync::Arc;

use crate::handlers::{
    dispatch::{check_tranche, check_user_tranches, get_expired_tranches_array, send_message},
    health::health_check,
    metrics::render_metrics,
};
use crate::middleware::only_localhost;

pub const DISPATCH_PREFIX: &str = "/showrunners/element_tracker";

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DispatchEngine>,
    pub prometheus: Option<PrometheusHandle>,
    pub local_only: bool,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    let mut dispatch = Router::new()
        .route("/send_message", post(send_message))
        .route("/get_expired_tranches_array", post(get_expired_tranches_array))
        .route("/check_user_tranches", post(check_user_tranches))
        .route("/check_tranche", post(check_tranche));
    if state.local_only {
        dispatch = dispatch.route_layer(middleware::from_fn(only_localhost));
    }

    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest(DISPATCH_PREFIX, dispatch);
    if state.prometheus.is_some() {
        router = router.route("/metrics", get(render_metrics));
    }

    router.with_state(state)
}
