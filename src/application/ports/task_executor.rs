//! Task Executor Port - 任务执行器
//!
//! 定义执行一个生成/删除任务的抽象接口，worker 只依赖此端口。
//! 具体实现在 infrastructure/adapters/executor 层

use async_trait::async_trait;
use thiserror::Error;

use super::task_manager::Task;

/// Task Executor 错误
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// 外部命令非零退出
    #[error("Command failed ({command}): exit {exit_code}")]
    CommandFailed { command: String, exit_code: i32 },

    /// 无法启动外部命令
    #[error("Failed to spawn command ({command}): {reason}")]
    SpawnFailed { command: String, reason: String },

    /// 任务类型未配置对应命令
    #[error("No command configured for task kind: {0}")]
    NotConfigured(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecutorError {
    /// 稳定的机器可读类别，写入任务记录的 error.kind
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutorError::CommandFailed { .. } => "command_failed",
            ExecutorError::SpawnFailed { .. } => "spawn_failed",
            ExecutorError::NotConfigured(_) => "not_configured",
            ExecutorError::Io(_) => "io_error",
        }
    }
}

/// Task Executor Port
///
/// execute 在任务的作用域锁持有期间被调用；
/// 成功返回结果载荷，失败由 worker 捕获并写入任务记录
#[async_trait]
pub trait TaskExecutorPort: Send + Sync {
    async fn execute(&self, task: &Task) -> Result<serde_json::Value, ExecutorError>;
}
