use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use notifier_core::NotifierError;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Notifier(#[from] NotifierError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("仅允许本机访问")]
    Forbidden,

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Notifier(NotifierError::InvalidArgument(_)) => {
                (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT")
            }
            ApiError::Notifier(NotifierError::UnknownNetwork(_)) => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_NETWORK")
            }
            ApiError::Notifier(e) if e.is_fetch_failure() => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_FETCH_FAILED")
            }
            ApiError::Notifier(NotifierError::Probe { .. }) => {
                (StatusCode::BAD_GATEWAY, "BALANCE_PROBE_FAILED")
            }
            ApiError::Notifier(_) | ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();
        if status.is_server_error() {
            error!("🔥 请求处理失败: {}", self);
        }

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": error_type,
                "code": status.as_u16(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
