//! Memory Infrastructure - 内存态组件

pub mod scope_locks;
pub mod task_manager;

pub use scope_locks::ScopeLockArena;
pub use task_manager::InMemoryTaskManager;
