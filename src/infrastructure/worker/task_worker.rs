//! Task Worker - 后台任务执行池
//!
//! 从队列取任务 id，按信号量限制并发后派发执行。
//! 执行顺序: 取作用域锁 → 置 running → 执行 → 写终态 → 放锁。
//! 任务在拿到全部锁之前保持 pending，running 只在持锁期间出现。

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};

use crate::application::ports::{TaskExecutorPort, TaskFailure, TaskManagerPort};
use crate::infrastructure::catalog::CatalogStore;
use crate::infrastructure::memory::ScopeLockArena;

/// 任务执行池
pub struct TaskWorker {
    manager: Arc<dyn TaskManagerPort>,
    executor: Arc<dyn TaskExecutorPort>,
    locks: Arc<ScopeLockArena>,
    semaphore: Arc<Semaphore>,
    /// 任务落盘后需要让目录快照失效
    catalog: Option<Arc<CatalogStore>>,
}

impl TaskWorker {
    pub fn new(
        manager: Arc<dyn TaskManagerPort>,
        executor: Arc<dyn TaskExecutorPort>,
        max_concurrent: usize,
        catalog: Option<Arc<CatalogStore>>,
    ) -> Self {
        Self {
            manager,
            executor,
            locks: Arc::new(ScopeLockArena::new()),
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            catalog,
        }
    }

    /// 启动消费循环；队列发送端全部关闭后退出
    pub fn spawn(self, mut queue: mpsc::Receiver<String>) -> tokio::task::JoinHandle<()> {
        let worker = Arc::new(self);
        tokio::spawn(async move {
            info!("Task worker started");
            while let Some(task_id) = queue.recv().await {
                let permit = match worker.semaphore.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };
                let worker = worker.clone();
                tokio::spawn(async move {
                    worker.process_task(&task_id).await;
                    drop(permit);
                });
            }
            info!("Task worker stopped");
        })
    }

    async fn process_task(&self, task_id: &str) {
        let task = match self.manager.get(task_id) {
            Some(task) => task,
            None => {
                warn!(task_id = %task_id, "Dequeued unknown task");
                return;
            }
        };

        let guards = self.locks.acquire(&task.scope).await;
        if let Err(e) = self.manager.set_running(task_id) {
            warn!(task_id = %task_id, error = %e, "Failed to mark task running");
            drop(guards);
            self.locks.sweep();
            return;
        }

        match self.executor.execute(&task).await {
            Ok(result) => {
                if let Err(e) = self.manager.set_succeeded(task_id, result) {
                    error!(task_id = %task_id, error = %e, "Failed to record task success");
                }
            }
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Task execution failed");
                let failure = TaskFailure {
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                };
                if let Err(e) = self.manager.set_failed(task_id, failure) {
                    error!(task_id = %task_id, error = %e, "Failed to record task failure");
                }
            }
        }

        if let Some(catalog) = &self.catalog {
            catalog.invalidate();
        }
        drop(guards);
        self.locks.sweep();
    }
}
