//! 任务管理端点（/admin 下，需鉴权）

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::application::ports::TaskSpec;
use crate::infrastructure::http::dto::{TaskCreateRequest, TaskResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn create_task(
    State(state): State<AppState>,
    Json(body): Json<TaskCreateRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let spec = TaskSpec {
        kind: body.task_type,
        book_id: body.book_id,
        chapters: body.chapters,
    };
    let task = state.task_manager.submit(spec)?;
    Ok((StatusCode::ACCEPTED, Json(task.into())))
}

pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<TaskResponse>> {
    Json(
        state
            .task_manager
            .list()
            .into_iter()
            .map(TaskResponse::from)
            .collect(),
    )
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state
        .task_manager
        .get(&task_id)
        .ok_or_else(|| ApiError::NotFound(format!("Task not found: {}", task_id)))?;
    Ok(Json(task.into()))
}

pub async fn get_task_log(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Response, ApiError> {
    let log_path = state
        .task_manager
        .log_path(&task_id)
        .ok_or_else(|| ApiError::NotFound(format!("Task not found: {}", task_id)))?;

    // 任务尚未产生输出时日志为空
    let content = match tokio::fs::read_to_string(&log_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(ApiError::Internal(format!("Failed to read task log: {}", e))),
    };

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        content,
    )
        .into_response())
}
