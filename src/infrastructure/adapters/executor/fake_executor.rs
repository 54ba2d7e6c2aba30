//! Fake Task Executor - 测试用
//!
//! 记录执行过的任务，暴露并发观测值；gate 可由测试持有，
//! 让任务停在执行中以观察状态与互斥行为。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::application::ports::{ExecutorError, Task, TaskExecutorPort, TaskKind};

/// 假执行器
#[derive(Default)]
pub struct FakeTaskExecutor {
    gate: Arc<Mutex<()>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
    executions: std::sync::Mutex<Vec<(TaskKind, String)>>,
    fail: AtomicBool,
}

impl FakeTaskExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 持有闸门：释放返回的 guard 之前，所有 execute 调用都会停在执行中
    pub async fn hold(&self) -> OwnedMutexGuard<()> {
        self.gate.clone().lock_owned().await
    }

    /// 观察到的最大并发执行数
    pub fn max_concurrent_seen(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    /// 已完成的执行记录 (kind, book_id)
    pub fn executions(&self) -> Vec<(TaskKind, String)> {
        self.executions
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TaskExecutorPort for FakeTaskExecutor {
    async fn execute(&self, task: &Task) -> Result<serde_json::Value, ExecutorError> {
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(running, Ordering::SeqCst);

        {
            let _pass = self.gate.lock().await;
        }

        self.running.fetch_sub(1, Ordering::SeqCst);
        if let Ok(mut executions) = self.executions.lock() {
            executions.push((task.kind, task.scope.book_id.clone()));
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(ExecutorError::CommandFailed {
                command: "fake".to_string(),
                exit_code: 1,
            });
        }
        Ok(serde_json::json!({
            "chapters": task.scope.chapter_ids.len(),
        }))
    }
}
