//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 内容目录配置
    #[serde(default)]
    pub content: ContentConfig,

    /// 远端镜像配置
    #[serde(default)]
    pub mirror: MirrorSettings,

    /// 媒体分发配置
    #[serde(default)]
    pub delivery: DeliverySettings,

    /// 后台任务配置
    #[serde(default)]
    pub tasks: TaskSettings,

    /// 翻译服务配置
    #[serde(default)]
    pub translation: TranslationSettings,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            content: ContentConfig::default(),
            mirror: MirrorSettings::default(),
            delivery: DeliverySettings::default(),
            tasks: TaskSettings::default(),
            translation: TranslationSettings::default(),
            log: LogConfig::default(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL（供外部客户端拼接资源链接使用）
    /// 如果未设置，则使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,

    /// 管理端点的 Bearer Token；未设置时管理端点不可用
    #[serde(default)]
    pub admin_token: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            admin_token: None,
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            let host = if self.host == "0.0.0.0" {
                "localhost"
            } else {
                &self.host
            };
            format!("http://{}:{}", host, self.port)
        })
    }
}

/// 内容目录配置
///
/// `data_root` 是元数据扫描与本地媒体分发的根目录；
/// 镜像模式下它同时是镜像的落地目录。
#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// 内容根目录
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// 目录扫描结果的缓存有效期（秒）
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: u64,
}

fn default_data_root() -> PathBuf {
    PathBuf::from("output")
}

fn default_refresh_ttl() -> u64 {
    2
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            refresh_ttl_secs: default_refresh_ttl(),
        }
    }
}

/// 远端镜像配置
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorSettings {
    /// 是否启用远端镜像（禁用时直接读取本地 data_root）
    #[serde(default)]
    pub enabled: bool,

    /// 远端对象存储的 HTTP 端点
    #[serde(default)]
    pub remote_endpoint: String,

    /// 仅下载匹配这些后缀的对象（大文件留在远端）
    #[serde(default = "default_include_suffixes")]
    pub include_suffixes: Vec<String>,

    /// 远端已删除的对象是否同步删除本地副本
    #[serde(default)]
    pub prune: bool,

    /// 两次同步之间的最小间隔（秒），用于合并并发刷新
    #[serde(default = "default_min_sync_interval")]
    pub min_sync_interval_secs: u64,

    /// 请求超时时间（秒）
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

fn default_include_suffixes() -> Vec<String> {
    vec![".json".to_string(), ".srt".to_string(), ".txt".to_string()]
}

fn default_min_sync_interval() -> u64 {
    2
}

fn default_remote_timeout() -> u64 {
    30
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            remote_endpoint: String::new(),
            include_suffixes: default_include_suffixes(),
            prune: false,
            min_sync_interval_secs: default_min_sync_interval(),
            timeout_secs: default_remote_timeout(),
        }
    }
}

/// 媒体分发模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// 从本地磁盘流式输出
    Local,
    /// 307 重定向到远端 URL，字节不经过本进程
    Redirect,
}

impl Default for DeliveryMode {
    fn default() -> Self {
        DeliveryMode::Local
    }
}

/// 媒体分发配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliverySettings {
    /// 分发模式
    #[serde(default)]
    pub mode: DeliveryMode,
}

/// 后台任务配置
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSettings {
    /// 任务日志目录
    #[serde(default = "default_log_root")]
    pub log_root: PathBuf,

    /// 最大并发任务数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// 任务队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 脚本生成命令
    #[serde(default = "default_script_command")]
    pub script_command: String,

    /// 音频生成命令
    #[serde(default = "default_audio_command")]
    pub audio_command: String,

    /// 字幕生成命令
    #[serde(default = "default_subtitle_command")]
    pub subtitle_command: String,
}

fn default_log_root() -> PathBuf {
    PathBuf::from("data/task_logs")
}

fn default_max_concurrent() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_script_command() -> String {
    "generate_script".to_string()
}

fn default_audio_command() -> String {
    "generate_audio".to_string()
}

fn default_subtitle_command() -> String {
    "generate_subtitles".to_string()
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            log_root: default_log_root(),
            max_concurrent: default_max_concurrent(),
            queue_capacity: default_queue_capacity(),
            script_command: default_script_command(),
            audio_command: default_audio_command(),
            subtitle_command: default_subtitle_command(),
        }
    }
}

/// 翻译服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationSettings {
    /// 翻译服务端点；未设置时翻译端点不可用
    #[serde(default)]
    pub endpoint: Option<String>,

    /// API Key
    #[serde(default)]
    pub api_key: Option<String>,

    /// 默认目标语言
    #[serde(default = "default_target_language")]
    pub default_target_language: String,

    /// LRU 缓存容量
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// 单次请求的最大文本长度（字符数）
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,

    /// 请求超时时间（秒）
    #[serde(default = "default_translate_timeout")]
    pub timeout_secs: u64,
}

fn default_target_language() -> String {
    "zh-TW".to_string()
}

fn default_cache_capacity() -> usize {
    256
}

fn default_max_text_chars() -> usize {
    5000
}

fn default_translate_timeout() -> u64 {
    30
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            default_target_language: default_target_language(),
            cache_capacity: default_cache_capacity(),
            max_text_chars: default_max_text_chars(),
            timeout_secs: default_translate_timeout(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
