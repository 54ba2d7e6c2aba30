//! Translator Port - 外部翻译服务
//!
//! 定义翻译提供方的抽象接口，缓存层只依赖此端口。
//! 具体实现在 infrastructure/adapters/translate 层

use async_trait::async_trait;
use thiserror::Error;

/// Translator 错误
///
/// Unreachable 与 Provider 的区分对应 HTTP 层的 503 / 502
#[derive(Debug, Error)]
pub enum TranslateError {
    /// 提供方不可达（网络/超时）
    #[error("Translation provider unreachable: {0}")]
    Unreachable(String),

    /// 提供方返回错误
    #[error("Translation provider error: {0}")]
    Provider(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// 翻译请求
#[derive(Debug, Clone)]
pub struct TranslateRequest {
    pub text: String,
    pub target_language: String,
    pub source_language: Option<String>,
}

/// 翻译结果
#[derive(Debug, Clone)]
pub struct TranslateOutcome {
    pub translated_text: String,
    pub detected_source_language: Option<String>,
}

/// Translator Port
#[async_trait]
pub trait TranslatorPort: Send + Sync {
    async fn translate(&self, request: &TranslateRequest)
        -> Result<TranslateOutcome, TranslateError>;
}
