use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

/// 分发端点统一的响应体 `{"result": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultResponse<T> {
    pub result: T,
}

impl<T> IntoResponse for ResultResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

pub fn created<T: Serialize>(result: T) -> impl IntoResponse {
    (StatusCode::CREATED, ResultResponse { result })
}
