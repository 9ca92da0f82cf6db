use axum::{extract::State, response::IntoResponse, Json};
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    response::created,
    routes::AppState,
    types::DispatchRequest,
};

/// 运行一次完整的调度周期
pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> ApiResult<impl IntoResponse> {
    debug!("调用 send_message: {:?}", request);
    let report = state
        .engine
        .dispatch_cycle(&request.simulation_options())
        .await?;
    Ok(created(report))
}

/// 已到期的分级列表
pub async fn get_expired_tranches_array(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> ApiResult<impl IntoResponse> {
    debug!("调用 get_expired_tranches_array: {:?}", request);
    let instruments = state.engine.list_expired_instruments().await?;
    Ok(created(instruments))
}

/// 评估单个用户的全部到期分级，不发送通知
pub async fn check_user_tranches(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> ApiResult<impl IntoResponse> {
    debug!("调用 check_user_tranches: {:?}", request);
    let outcome = state
        .engine
        .check_user_tranches(request.user, &request.simulation_options())
        .await?;
    Ok(created(outcome))
}

/// 评估单个用户在指定到期分级上的持仓
pub async fn check_tranche(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> ApiResult<impl IntoResponse> {
    debug!("调用 check_tranche: {:?}", request);
    let index = request
        .tranche
        .ok_or_else(|| ApiError::BadRequest("缺少 tranche 下标".to_string()))?;
    let result = state
        .engine
        .check_tranche(request.user, index, &request.simulation_options())
        .await?;
    Ok(created(result))
}
