//! Translation Cache - 有界 LRU 翻译缓存
//!
//! 以 (text, target, source, context) 为键缓存外部翻译结果。
//! LruCache 的查找与访问序变更在同一把锁内完成，锁绝不跨 await 持有：
//! 未命中时先放锁再调 provider，成功后重新加锁写入。
//! 并发未命中同一键会重复请求一次 provider，结果幂等，可接受。

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::application::ports::{TranslateError, TranslateRequest, TranslatorPort};
use crate::config::TranslationSettings;

/// Translation Cache 错误
#[derive(Debug, Error)]
pub enum TranslationCacheError {
    /// 输入不合法（空文本 / 超长）
    #[error("Invalid translation input: {0}")]
    InvalidInput(String),

    /// 提供方不可达
    #[error("Translation service unavailable: {0}")]
    Unavailable(String),

    /// 提供方返回错误
    #[error("Translation provider error: {0}")]
    Upstream(String),
}

/// 翻译结果
#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    pub translated_text: String,
    pub detected_source_language: Option<String>,
    /// 本次结果是否取自缓存
    pub cached: bool,
}

/// 缓存键；context 为空时相同 (text, target, source) 视为同一条目
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    text: String,
    target: String,
    source: String,
    context: Vec<String>,
}

#[derive(Clone)]
struct CachedEntry {
    translated_text: String,
    detected_source_language: Option<String>,
}

/// 有界 LRU 翻译缓存
pub struct TranslationCache {
    provider: Arc<dyn TranslatorPort>,
    settings: TranslationSettings,
    inner: Mutex<LruCache<CacheKey, CachedEntry>>,
}

impl TranslationCache {
    pub fn new(provider: Arc<dyn TranslatorPort>, settings: TranslationSettings) -> Self {
        let capacity =
            NonZeroUsize::new(settings.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            provider,
            settings,
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// 翻译一段文本，优先命中缓存
    pub async fn translate(
        &self,
        text: &str,
        target_language: Option<String>,
        source_language: Option<String>,
        context_keys: &[String],
    ) -> Result<Translation, TranslationCacheError> {
        if text.trim().is_empty() {
            return Err(TranslationCacheError::InvalidInput(
                "text must not be empty".to_string(),
            ));
        }
        if text.chars().count() > self.settings.max_text_chars {
            return Err(TranslationCacheError::InvalidInput(format!(
                "text exceeds {} characters",
                self.settings.max_text_chars
            )));
        }

        let target = target_language
            .unwrap_or_else(|| self.settings.default_target_language.clone());
        let key = CacheKey {
            text: text.to_string(),
            target: target.clone(),
            source: source_language.clone().unwrap_or_default(),
            context: context_keys.to_vec(),
        };

        if let Some(entry) = self.lookup(&key) {
            debug!(target = %target, "Translation cache hit");
            return Ok(Translation {
                translated_text: entry.translated_text,
                detected_source_language: entry.detected_source_language,
                cached: true,
            });
        }

        let request = TranslateRequest {
            text: text.to_string(),
            target_language: target,
            source_language,
        };
        let outcome = self
            .provider
            .translate(&request)
            .await
            .map_err(|e| match e {
                TranslateError::Unreachable(msg) => TranslationCacheError::Unavailable(msg),
                TranslateError::Provider(msg) | TranslateError::InvalidResponse(msg) => {
                    TranslationCacheError::Upstream(msg)
                }
            })?;

        self.insert(
            key,
            CachedEntry {
                translated_text: outcome.translated_text.clone(),
                detected_source_language: outcome.detected_source_language.clone(),
            },
        );

        Ok(Translation {
            translated_text: outcome.translated_text,
            detected_source_language: outcome.detected_source_language,
            cached: false,
        })
    }

    /// 当前缓存条目数
    pub fn len(&self) -> usize {
        self.inner.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &CacheKey) -> Option<CachedEntry> {
        // get 同时完成命中提升
        self.inner.lock().ok()?.get(key).cloned()
    }

    fn insert(&self, key: CacheKey, entry: CachedEntry) {
        if let Ok(mut cache) = self.inner.lock() {
            // put 超容量时自动淘汰最旧条目
            cache.put(key, entry);
        }
    }
}
