//! Fabula - 播客书内容分发服务
//!
//! 面向读多写少场景的 HTTP 后端：对生成管线产出的播客书产物
//! （脚本/音频/字幕/元数据）提供目录浏览、媒体分发、翻译与
//! 后台生成任务管理。
//!
//! # 架构
//!
//! 六边形分层：
//! - `domain`: Catalog 投影实体，目录树的只读快照
//! - `application`: 端口定义（远端存储/翻译/任务管理/任务执行）与统一错误
//! - `infrastructure`: 扫描器、远端镜像、翻译缓存、任务池、HTTP 接口
//! - `config`: 配置加载（文件 + FABULA_ 环境变量）
//!
//! # 数据流
//!
//! ```text
//! remote store ──sync──> data_root ──scan──> Catalog ──> HTTP
//!                            ^                             │
//!                            └── task worker <── admin ────┘
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
