//! HTTP 中间件

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use super::error::ApiError;
use super::state::AppState;

/// 管理端点鉴权
///
/// 未配置 token → 503（管理功能关闭）；
/// 缺少凭证 → 401；凭证错误 → 403
pub async fn admin_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let expected = match &state.admin_token {
        Some(token) => token,
        None => {
            return ApiError::ServiceUnavailable("Admin endpoints are disabled".to_string())
                .into_response()
        }
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        None => ApiError::Unauthorized("Missing bearer token".to_string()).into_response(),
        Some(token) if token == expected => next.run(request).await,
        Some(_) => ApiError::Forbidden("Invalid admin token".to_string()).into_response(),
    }
}

/// 错误日志：5xx 记 error，4xx 记 warn
pub async fn log_errors(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    let status = response.status();
    if status.is_server_error() {
        error!(%method, %path, status = %status, "Request failed");
    } else if status.is_client_error() {
        warn!(%method, %path, status = %status, "Request rejected");
    }
    response
}
