//! Configuration Module
//!
//! 配置类型定义与加载

mod loader;
mod types;

pub use loader::{load_config, load_config_from_path, print_config, ConfigError};
pub use types::{
    AppConfig, ContentConfig, DeliveryMode, DeliverySettings, LogConfig, MirrorSettings,
    ServerConfig, TaskSettings, TranslationSettings,
};
