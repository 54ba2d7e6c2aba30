//! Adapters - 外部系统适配器

pub mod executor;
pub mod remote;
pub mod translate;
