//! Remote Store Adapters - 远端对象存储实现

pub mod http_remote_store;
pub mod memory_remote_store;

pub use http_remote_store::HttpRemoteStore;
pub use memory_remote_store::MemoryRemoteStore;
