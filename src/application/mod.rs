//! Application Layer - 应用层
//!
//! 端口定义与统一错误类型

pub mod error;
pub mod ports;

pub use error::ApplicationError;
