//! Fake Translate Client - 测试/离线开发用
//!
//! 返回 `[{target}] {text}`，记录调用次数，可注入失败

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::application::ports::{
    TranslateError, TranslateOutcome, TranslateRequest, TranslatorPort,
};

/// 假翻译客户端
#[derive(Default)]
pub struct FakeTranslateClient {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl FakeTranslateClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累计 translate 调用次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 让后续调用失败
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TranslatorPort for FakeTranslateClient {
    async fn translate(
        &self,
        request: &TranslateRequest,
    ) -> Result<TranslateOutcome, TranslateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(TranslateError::Unreachable(
                "injected provider failure".to_string(),
            ));
        }
        Ok(TranslateOutcome {
            translated_text: format!("[{}] {}", request.target_language, request.text),
            detected_source_language: Some("en".to_string()),
        })
    }
}
