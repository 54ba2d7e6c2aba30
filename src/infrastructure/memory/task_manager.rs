//! 内存 Task Manager
//!
//! DashMap 持有全部任务记录，mpsc 队列向 worker 投递任务 id。
//! 状态写入集中在这里，转移前先过 can_transition_to 校验，
//! 非法转移（含终态回写）一律拒绝。

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::application::ports::{
    Task, TaskError, TaskFailure, TaskManagerPort, TaskSpec, TaskStatus,
};

/// 内存任务管理器
pub struct InMemoryTaskManager {
    tasks: DashMap<String, Task>,
    queue: mpsc::Sender<String>,
    log_root: PathBuf,
}

impl InMemoryTaskManager {
    /// 创建管理器与配套的任务队列接收端（交给 worker）
    pub fn new(queue_capacity: usize, log_root: PathBuf) -> (Arc<Self>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let manager = Arc::new(Self {
            tasks: DashMap::new(),
            queue: tx,
            log_root,
        });
        (manager, rx)
    }

    fn transition(
        &self,
        task_id: &str,
        next: TaskStatus,
        apply: impl FnOnce(&mut Task),
    ) -> Result<(), TaskError> {
        let mut task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
        if !task.status.can_transition_to(next) {
            return Err(TaskError::InvalidStateTransition(format!(
                "task {} cannot go {} -> {}",
                task_id,
                task.status.as_str(),
                next.as_str()
            )));
        }
        task.status = next;
        task.updated_at = chrono::Utc::now();
        apply(&mut *task);
        info!(task_id = %task_id, status = next.as_str(), "Task status changed");
        Ok(())
    }
}

impl TaskManagerPort for InMemoryTaskManager {
    fn submit(&self, spec: TaskSpec) -> Result<Task, TaskError> {
        let scope = spec.validate()?;
        let mut task = Task::new(spec.kind, scope, PathBuf::new());
        task.log_path = self.log_root.join(format!("{}.log", task.id));

        self.tasks.insert(task.id.clone(), task.clone());
        if let Err(e) = self.queue.try_send(task.id.clone()) {
            self.tasks.remove(&task.id);
            warn!(task_id = %task.id, error = %e, "Failed to enqueue task");
            return Err(TaskError::QueueFull);
        }

        info!(
            task_id = %task.id,
            kind = task.kind.as_str(),
            book = %task.scope.book_id,
            chapters = task.scope.chapter_ids.len(),
            "Task submitted"
        );
        Ok(task)
    }

    fn get(&self, task_id: &str) -> Option<Task> {
        self.tasks.get(task_id).map(|t| t.clone())
    }

    fn list(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.iter().map(|t| t.clone()).collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        tasks
    }

    fn set_running(&self, task_id: &str) -> Result<(), TaskError> {
        self.transition(task_id, TaskStatus::Running, |_| {})
    }

    fn set_succeeded(&self, task_id: &str, result: serde_json::Value) -> Result<(), TaskError> {
        self.transition(task_id, TaskStatus::Succeeded, |task| {
            task.result = Some(result);
        })
    }

    fn set_failed(&self, task_id: &str, failure: TaskFailure) -> Result<(), TaskError> {
        self.transition(task_id, TaskStatus::Failed, |task| {
            task.error = Some(failure);
        })
    }

    fn log_path(&self, task_id: &str) -> Option<PathBuf> {
        self.tasks.get(task_id).map(|t| t.log_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::TaskKind;

    fn spec(chapters: &[&str]) -> TaskSpec {
        TaskSpec {
            kind: TaskKind::GenerateAudio,
            book_id: Some("foundation".to_string()),
            chapters: chapters.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_submit_enqueues_pending_task() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, mut rx) = InMemoryTaskManager::new(8, dir.path().to_path_buf());

        let task = manager.submit(spec(&["chapter0"])).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(rx.recv().await.unwrap(), task.id);
        assert!(manager.get(&task.id).is_some());
    }

    #[tokio::test]
    async fn test_invalid_spec_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _rx) = InMemoryTaskManager::new(8, dir.path().to_path_buf());

        assert!(matches!(
            manager.submit(spec(&[])),
            Err(TaskError::InvalidSpec(_))
        ));
        assert!(manager.list().is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_rejects_submission() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _rx) = InMemoryTaskManager::new(1, dir.path().to_path_buf());

        manager.submit(spec(&["chapter0"])).unwrap();
        let result = manager.submit(spec(&["chapter1"]));
        assert!(matches!(result, Err(TaskError::QueueFull)));
        // 被拒绝的任务不留痕
        assert_eq!(manager.list().len(), 1);
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _rx) = InMemoryTaskManager::new(8, dir.path().to_path_buf());

        let task = manager.submit(spec(&["chapter0"])).unwrap();
        manager.set_running(&task.id).unwrap();
        manager
            .set_succeeded(&task.id, serde_json::json!({"chapters": 1}))
            .unwrap();

        let done = manager.get(&task.id).unwrap();
        assert_eq!(done.status, TaskStatus::Succeeded);
        assert!(done.result.is_some());
        assert!(done.updated_at >= done.created_at);
    }

    #[tokio::test]
    async fn test_terminal_status_is_immutable() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _rx) = InMemoryTaskManager::new(8, dir.path().to_path_buf());

        let task = manager.submit(spec(&["chapter0"])).unwrap();
        manager.set_running(&task.id).unwrap();
        manager
            .set_failed(
                &task.id,
                TaskFailure {
                    kind: "command_failed".to_string(),
                    message: "exit 1".to_string(),
                },
            )
            .unwrap();

        assert!(matches!(
            manager.set_running(&task.id),
            Err(TaskError::InvalidStateTransition(_))
        ));
        assert!(matches!(
            manager.set_succeeded(&task.id, serde_json::json!({})),
            Err(TaskError::InvalidStateTransition(_))
        ));
        let done = manager.get(&task.id).unwrap();
        assert_eq!(done.status, TaskStatus::Failed);
        assert_eq!(done.error.as_ref().unwrap().kind, "command_failed");
    }

    #[tokio::test]
    async fn test_skip_running_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _rx) = InMemoryTaskManager::new(8, dir.path().to_path_buf());

        let task = manager.submit(spec(&["chapter0"])).unwrap();
        assert!(matches!(
            manager.set_succeeded(&task.id, serde_json::json!({})),
            Err(TaskError::InvalidStateTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _rx) = InMemoryTaskManager::new(8, dir.path().to_path_buf());

        let first = manager.submit(spec(&["chapter0"])).unwrap();
        let second = manager.submit(spec(&["chapter1"])).unwrap();

        let listed = manager.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_unknown_task_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _rx) = InMemoryTaskManager::new(8, dir.path().to_path_buf());

        assert!(manager.get("missing").is_none());
        assert!(matches!(
            manager.set_running("missing"),
            Err(TaskError::NotFound(_))
        ));
    }
}
