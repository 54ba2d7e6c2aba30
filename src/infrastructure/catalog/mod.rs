//! Catalog Infrastructure - 目录扫描与快照缓存

pub mod etag;
pub mod scanner;
pub mod store;

pub use scanner::{RemoteEntry, RemoteIndex};
pub use store::CatalogStore;
