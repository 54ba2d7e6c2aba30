//! HTTP 错误映射
//!
//! 所有失败以真实状态码 + JSON `{"kind", "error"}` 返回。
//! kind 是稳定的机器可读类别，客户端据此分支，不解析 error 文本。

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::application::ports::TaskError;
use crate::application::ApplicationError;
use crate::infrastructure::mirror::MirrorError;
use crate::infrastructure::translation::TranslationCacheError;

/// API 错误
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    /// 请求的字节区间超出文件大小
    #[error("Requested range not satisfiable")]
    RangeNotSatisfiable { size: u64 },

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::RangeNotSatisfiable { .. } => "range_not_satisfiable",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::BadGateway(_) => "bad_gateway",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "kind": self.kind(),
            "error": self.to_string(),
        }));
        match self {
            ApiError::RangeNotSatisfiable { size } => (
                status,
                [(header::CONTENT_RANGE, format!("bytes */{}", size))],
                body,
            )
                .into_response(),
            _ => (status, body).into_response(),
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ApplicationError::ValidationError(_) => ApiError::BadRequest(e.to_string()),
            ApplicationError::ServiceUnavailable(_) => ApiError::ServiceUnavailable(e.to_string()),
            ApplicationError::UpstreamError(_) => ApiError::BadGateway(e.to_string()),
            ApplicationError::StorageError(_) | ApplicationError::InternalError(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<TranslationCacheError> for ApiError {
    fn from(e: TranslationCacheError) -> Self {
        match e {
            TranslationCacheError::InvalidInput(_) => ApiError::BadRequest(e.to_string()),
            TranslationCacheError::Unavailable(_) => ApiError::ServiceUnavailable(e.to_string()),
            TranslationCacheError::Upstream(_) => ApiError::BadGateway(e.to_string()),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(e: TaskError) -> Self {
        match e {
            TaskError::NotFound(_) => ApiError::NotFound(e.to_string()),
            TaskError::InvalidSpec(_) => ApiError::BadRequest(e.to_string()),
            TaskError::InvalidStateTransition(_) => ApiError::Internal(e.to_string()),
            TaskError::QueueFull => ApiError::ServiceUnavailable(e.to_string()),
        }
    }
}

impl From<MirrorError> for ApiError {
    fn from(e: MirrorError) -> Self {
        match e {
            MirrorError::Unavailable(_) => ApiError::ServiceUnavailable(e.to_string()),
            MirrorError::Io(_) => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::RangeNotSatisfiable { size: 10 }.status(),
            StatusCode::RANGE_NOT_SATISFIABLE
        );
        assert_eq!(
            ApiError::ServiceUnavailable("x".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_task_error_mapping() {
        assert!(matches!(
            ApiError::from(TaskError::QueueFull),
            ApiError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            ApiError::from(TaskError::InvalidSpec("x".into())),
            ApiError::BadRequest(_)
        ));
    }
}
