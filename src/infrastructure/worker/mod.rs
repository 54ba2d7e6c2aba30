//! Worker Infrastructure - 后台任务执行

pub mod task_worker;

pub use task_worker::TaskWorker;
