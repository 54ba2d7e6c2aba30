//! Infrastructure Layer - 基础设施层

pub mod adapters;
pub mod catalog;
pub mod http;
pub mod memory;
pub mod mirror;
pub mod translation;
pub mod worker;
