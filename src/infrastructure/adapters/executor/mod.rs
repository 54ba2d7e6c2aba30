//! Task Executor Adapters - 任务执行实现

pub mod fake_executor;
pub mod process_executor;

pub use fake_executor::FakeTaskExecutor;
pub use process_executor::ProcessTaskExecutor;
