//! Task Manager Port - 生成任务管理
//!
//! 定义任务管理的抽象接口，具体实现在 infrastructure/memory 层

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Task Manager 错误
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Invalid task spec: {0}")]
    InvalidSpec(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Task queue full")]
    QueueFull,
}

/// 任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// 生成脚本
    GenerateScript,
    /// 生成音频
    GenerateAudio,
    /// 生成字幕
    GenerateSubtitles,
    /// 删除章节产物
    Delete,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::GenerateScript => "generate_script",
            TaskKind::GenerateAudio => "generate_audio",
            TaskKind::GenerateSubtitles => "generate_subtitles",
            TaskKind::Delete => "delete",
        }
    }
}

/// 任务状态
///
/// 状态机: pending → running → succeeded | failed
/// 终态不可再变更；不存在任何回退边
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }

    /// 状态只能前进
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Pending, TaskStatus::Failed)
                | (TaskStatus::Running, TaskStatus::Succeeded)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }
}

/// 任务作用域：book + 章节集合
///
/// 互斥锁按 (book, chapter) 逐对加锁，作用域重叠的任务串行执行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskScope {
    pub book_id: String,
    pub chapter_ids: Vec<String>,
}

impl TaskScope {
    /// 作用域的互斥键集合，排序后返回（固定加锁顺序，避免死锁）
    pub fn lock_keys(&self) -> Vec<(String, String)> {
        let mut keys: Vec<(String, String)> = self
            .chapter_ids
            .iter()
            .map(|c| (self.book_id.clone(), c.clone()))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// 任务提交内容
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSpec {
    pub kind: TaskKind,
    pub book_id: Option<String>,
    #[serde(default)]
    pub chapters: Vec<String>,
}

impl TaskSpec {
    /// 校验并解析为作用域
    ///
    /// 所有任务都必须给出 book 与至少一个章节，
    /// 互斥锁按 (book, chapter) 粒度加锁
    pub fn validate(&self) -> Result<TaskScope, TaskError> {
        let book_id = self
            .book_id
            .clone()
            .ok_or_else(|| TaskError::InvalidSpec("book_id is required".to_string()))?;
        if book_id.is_empty() {
            return Err(TaskError::InvalidSpec("book_id must not be empty".to_string()));
        }

        if self.chapters.is_empty() {
            return Err(TaskError::InvalidSpec(
                "chapters must not be empty".to_string(),
            ));
        }
        if self.chapters.iter().any(|c| c.is_empty() || c.contains('/')) {
            return Err(TaskError::InvalidSpec(
                "chapter ids must be plain directory names".to_string(),
            ));
        }

        Ok(TaskScope {
            book_id,
            chapter_ids: self.chapters.clone(),
        })
    }
}

/// 捕获的执行失败，保存在任务记录上，不回抛给提交者
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFailure {
    /// 稳定的机器可读类别
    pub kind: String,
    pub message: String,
}

/// 生成任务记录
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub kind: TaskKind,
    pub scope: TaskScope,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 任务日志文件
    pub log_path: PathBuf,
    /// 成功时的结果载荷
    pub result: Option<serde_json::Value>,
    /// 失败时的结构化错误
    pub error: Option<TaskFailure>,
}

impl Task {
    pub fn new(kind: TaskKind, scope: TaskScope, log_path: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().simple().to_string(),
            kind,
            scope,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
            log_path,
            result: None,
            error: None,
        }
    }
}

/// Task Manager Port
///
/// 管理任务的全生命周期；Task Manager 是状态的唯一写入者
pub trait TaskManagerPort: Send + Sync {
    /// 提交任务：立即返回 pending 记录，绝不阻塞在生成工作上
    fn submit(&self, spec: TaskSpec) -> Result<Task, TaskError>;

    /// 获取任务
    fn get(&self, task_id: &str) -> Option<Task>;

    /// 所有已知任务，新任务在前
    fn list(&self) -> Vec<Task>;

    /// pending → running
    fn set_running(&self, task_id: &str) -> Result<(), TaskError>;

    /// → succeeded，记录结果载荷
    fn set_succeeded(&self, task_id: &str, result: serde_json::Value) -> Result<(), TaskError>;

    /// → failed，记录结构化错误
    fn set_failed(&self, task_id: &str, failure: TaskFailure) -> Result<(), TaskError>;

    /// 任务日志文件路径
    fn log_path(&self, task_id: &str) -> Option<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions_forward_only() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Running));
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Failed));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Succeeded));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Failed));

        assert!(!TaskStatus::Running.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Succeeded.can_transition_to(TaskStatus::Running));
        assert!(!TaskStatus::Failed.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Succeeded.can_transition_to(TaskStatus::Failed));
    }

    #[test]
    fn test_spec_validation_requires_chapters_for_audio() {
        let spec = TaskSpec {
            kind: TaskKind::GenerateAudio,
            book_id: Some("foundation".to_string()),
            chapters: vec![],
        };
        assert!(matches!(spec.validate(), Err(TaskError::InvalidSpec(_))));
    }

    #[test]
    fn test_spec_validation_accepts_single_chapter() {
        let spec = TaskSpec {
            kind: TaskKind::GenerateScript,
            book_id: Some("foundation".to_string()),
            chapters: vec!["chapter0".to_string()],
        };
        let scope = spec.validate().unwrap();
        assert_eq!(scope.book_id, "foundation");
        assert_eq!(scope.chapter_ids, vec!["chapter0".to_string()]);
    }

    #[test]
    fn test_spec_validation_rejects_path_like_chapter() {
        let spec = TaskSpec {
            kind: TaskKind::Delete,
            book_id: Some("foundation".to_string()),
            chapters: vec!["../etc".to_string()],
        };
        assert!(matches!(spec.validate(), Err(TaskError::InvalidSpec(_))));
    }

    #[test]
    fn test_scope_lock_keys_sorted_and_deduped() {
        let scope = TaskScope {
            book_id: "foundation".to_string(),
            chapter_ids: vec![
                "chapter2".to_string(),
                "chapter0".to_string(),
                "chapter2".to_string(),
            ],
        };
        let keys = scope.lock_keys();
        assert_eq!(
            keys,
            vec![
                ("foundation".to_string(), "chapter0".to_string()),
                ("foundation".to_string(), "chapter2".to_string()),
            ]
        );
    }

}
