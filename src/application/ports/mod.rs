//! Application Ports - 端口定义

pub mod remote_store;
pub mod task_executor;
pub mod task_manager;
pub mod translator;

pub use remote_store::{RemoteObject, RemoteStoreError, RemoteStorePort};
pub use task_executor::{ExecutorError, TaskExecutorPort};
pub use task_manager::{
    Task, TaskError, TaskFailure, TaskKind, TaskManagerPort, TaskScope, TaskSpec, TaskStatus,
};
pub use translator::{TranslateError, TranslateOutcome, TranslateRequest, TranslatorPort};
