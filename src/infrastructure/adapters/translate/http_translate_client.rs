//! HTTP Translate Client - 外部翻译服务客户端
//!
//! 请求: `POST {endpoint}` body `{"q", "target", "source"?}`，
//! 可选 Bearer Token；响应: `{"translatedText", "detectedSourceLanguage"?}`

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ports::{
    TranslateError, TranslateOutcome, TranslateRequest, TranslatorPort,
};

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    q: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    translated_text: String,
    detected_source_language: Option<String>,
}

/// HTTP 翻译客户端
pub struct HttpTranslateClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTranslateClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslateError::Unreachable(format!("Failed to build client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl TranslatorPort for HttpTranslateClient {
    async fn translate(
        &self,
        request: &TranslateRequest,
    ) -> Result<TranslateOutcome, TranslateError> {
        debug!(
            target = %request.target_language,
            chars = request.text.chars().count(),
            "Calling translation provider"
        );

        let body = WireRequest {
            q: &request.text,
            target: &request.target_language,
            source: request.source_language.as_deref(),
        };

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                TranslateError::Unreachable(e.to_string())
            } else {
                TranslateError::Provider(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(TranslateError::Provider(format!(
                "Provider returned status {}",
                response.status()
            )));
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::InvalidResponse(e.to_string()))?;

        Ok(TranslateOutcome {
            translated_text: parsed.translated_text,
            detected_source_language: parsed.detected_source_language,
        })
    }
}
