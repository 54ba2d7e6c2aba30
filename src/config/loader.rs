//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `FABULA_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `FABULA_SERVER__PORT=8080`
/// - `FABULA_CONTENT__DATA_ROOT=/data/output`
/// - `FABULA_MIRROR__REMOTE_ENDPOINT=http://objects:9000`
/// - `FABULA_DELIVERY__MODE=redirect`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5080)?
        .set_default("content.data_root", "output")?
        .set_default("content.refresh_ttl_secs", 2)?
        .set_default("mirror.enabled", false)?
        .set_default("mirror.remote_endpoint", "")?
        .set_default("mirror.prune", false)?
        .set_default("mirror.min_sync_interval_secs", 2)?
        .set_default("mirror.timeout_secs", 30)?
        .set_default("delivery.mode", "local")?
        .set_default("tasks.log_root", "data/task_logs")?
        .set_default("tasks.max_concurrent", 2)?
        .set_default("tasks.queue_capacity", 1000)?
        .set_default("tasks.script_command", "generate_script")?
        .set_default("tasks.audio_command", "generate_audio")?
        .set_default("tasks.subtitle_command", "generate_subtitles")?
        .set_default("translation.default_target_language", "zh-TW")?
        .set_default("translation.cache_capacity", 256)?
        .set_default("translation.max_text_chars", 5000)?
        .set_default("translation.timeout_secs", 30)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: FABULA_
    // 层级分隔符: __ (双下划线)
    // 例如: FABULA_MIRROR__REMOTE_ENDPOINT=http://objects:9000
    builder = builder.add_source(
        Environment::with_prefix("FABULA")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // 验证端口范围
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    // 验证内容根目录
    if config.content.data_root.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Content data_root cannot be empty".to_string(),
        ));
    }

    // 镜像启用时必须提供远端端点
    if config.mirror.enabled && config.mirror.remote_endpoint.is_empty() {
        return Err(ConfigError::ValidationError(
            "mirror.remote_endpoint is required when mirror is enabled".to_string(),
        ));
    }

    // 重定向分发依赖镜像的远端索引
    if config.delivery.mode == crate::config::DeliveryMode::Redirect && !config.mirror.enabled {
        return Err(ConfigError::ValidationError(
            "delivery.mode = redirect requires the remote mirror to be enabled".to_string(),
        ));
    }

    // 验证任务池
    if config.tasks.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "tasks.max_concurrent cannot be 0".to_string(),
        ));
    }

    // 验证翻译缓存
    if config.translation.cache_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "translation.cache_capacity cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    tracing::info!("Content Root: {:?}", config.content.data_root);
    tracing::info!("Refresh TTL: {}s", config.content.refresh_ttl_secs);
    tracing::info!("Mirror Enabled: {}", config.mirror.enabled);
    if config.mirror.enabled {
        tracing::info!("Mirror Endpoint: {}", config.mirror.remote_endpoint);
        tracing::info!("Mirror Suffixes: {:?}", config.mirror.include_suffixes);
        tracing::info!("Mirror Prune: {}", config.mirror.prune);
    }
    tracing::info!("Delivery Mode: {:?}", config.delivery.mode);
    tracing::info!("Task Log Root: {:?}", config.tasks.log_root);
    tracing::info!("Task Max Concurrent: {}", config.tasks.max_concurrent);
    tracing::info!(
        "Translation Enabled: {}",
        config.translation.endpoint.is_some()
    );
    tracing::info!("Admin Enabled: {}", config.server.admin_token.is_some());
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
