//! HTTP Remote Store - 远端对象存储客户端
//!
//! 对象存储网关的 HTTP API:
//! - `GET {endpoint}/list?prefix={prefix}` → `{"objects": [{key, etag, generation, size}]}`
//! - `GET {endpoint}/object/{key}` → 对象字节
//!
//! 公开 URL 与下载 URL 同构，重定向分发直接下发给客户端。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::{RemoteObject, RemoteStoreError, RemoteStorePort};

#[derive(Debug, Deserialize)]
struct ListResponse {
    objects: Vec<ListObject>,
}

#[derive(Debug, Deserialize)]
struct ListObject {
    key: String,
    etag: String,
    generation: String,
    size: u64,
}

/// HTTP 对象存储客户端
pub struct HttpRemoteStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRemoteStore {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RemoteStoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteStoreError::Unreachable(format!("Failed to build client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    fn map_request_error(e: reqwest::Error) -> RemoteStoreError {
        if e.is_timeout() || e.is_connect() {
            RemoteStoreError::Unreachable(e.to_string())
        } else {
            RemoteStoreError::InvalidResponse(e.to_string())
        }
    }
}

#[async_trait]
impl RemoteStorePort for HttpRemoteStore {
    async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>, RemoteStoreError> {
        let url = format!("{}/list", self.endpoint);
        debug!(url = %url, prefix = %prefix, "Listing remote objects");

        let response = self
            .client
            .get(&url)
            .query(&[("prefix", prefix)])
            .send()
            .await
            .map_err(Self::map_request_error)?;

        if !response.status().is_success() {
            return Err(RemoteStoreError::InvalidResponse(format!(
                "List returned status {}",
                response.status()
            )));
        }

        let parsed: ListResponse = response
            .json()
            .await
            .map_err(|e| RemoteStoreError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .objects
            .into_iter()
            .map(|o| RemoteObject {
                key: o.key,
                etag: o.etag,
                generation: o.generation,
                size: o.size,
            })
            .collect())
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, RemoteStoreError> {
        let url = self.public_url(key);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RemoteStoreError::NotFound(key.to_string()));
        }
        if !response.status().is_success() {
            return Err(RemoteStoreError::InvalidResponse(format!(
                "Fetch returned status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteStoreError::InvalidResponse(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/object/{}", self.endpoint, key)
    }
}
