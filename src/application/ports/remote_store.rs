//! Remote Store Port - 远端对象存储
//!
//! 定义远端对象列举/下载的抽象接口，镜像组件只依赖此端口。
//! 具体实现在 infrastructure/adapters/remote 层

use async_trait::async_trait;
use thiserror::Error;

/// Remote Store 错误
#[derive(Debug, Error)]
pub enum RemoteStoreError {
    /// 远端不可达（网络/超时），调用方应视为 503
    #[error("Remote store unreachable: {0}")]
    Unreachable(String),

    #[error("Remote object not found: {0}")]
    NotFound(String),

    #[error("Invalid remote response: {0}")]
    InvalidResponse(String),
}

/// 远端对象的一次列举结果
///
/// etag/generation/size 共同构成变更指纹
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// 对象键（相对路径，`/` 分隔）
    pub key: String,
    pub etag: String,
    pub generation: String,
    pub size: u64,
}

impl RemoteObject {
    /// 变更指纹：任何一项变化都视为远端已更新
    pub fn fingerprint(&self) -> String {
        format!("{}:{}:{}", self.etag, self.generation, self.size)
    }
}

/// Remote Store Port
#[async_trait]
pub trait RemoteStorePort: Send + Sync {
    /// 列举指定前缀下的所有对象
    async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>, RemoteStoreError>;

    /// 下载对象内容
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, RemoteStoreError>;

    /// 对象的公开访问 URL（重定向分发使用）
    fn public_url(&self, key: &str) -> String;
}
