//! Domain Layer - 领域层
//!
//! Catalog Context: 书籍/章节/资源的只读投影

pub mod catalog;
