//! 内存 Remote Store - 测试/离线开发用
//!
//! DashMap 持有对象内容，etag 取内容 MD5，每次写入递增 generation。
//! 可注入列举失败，用于验证同步失败时本地缓存不受影响。

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::application::ports::{RemoteObject, RemoteStoreError, RemoteStorePort};

struct MemoryObject {
    data: Vec<u8>,
    etag: String,
    generation: u64,
}

/// 内存对象存储
pub struct MemoryRemoteStore {
    base_url: String,
    objects: DashMap<String, MemoryObject>,
    next_generation: AtomicU64,
    fetch_calls: AtomicUsize,
    fail_listing: AtomicBool,
}

impl MemoryRemoteStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: DashMap::new(),
            next_generation: AtomicU64::new(1),
            fetch_calls: AtomicUsize::new(0),
            fail_listing: AtomicBool::new(false),
        }
    }

    /// 写入对象（重复写入视为远端内容更新）
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        let data = data.into();
        let etag = format!("{:x}", md5::compute(&data));
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        self.objects.insert(
            key.into(),
            MemoryObject {
                data,
                etag,
                generation,
            },
        );
    }

    pub fn remove(&self, key: &str) {
        self.objects.remove(key);
    }

    /// 累计 fetch 调用次数
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// 让后续 list 调用失败
    pub fn set_fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteStorePort for MemoryRemoteStore {
    async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>, RemoteStoreError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(RemoteStoreError::Unreachable(
                "injected listing failure".to_string(),
            ));
        }
        let mut objects: Vec<RemoteObject> = self
            .objects
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| RemoteObject {
                key: entry.key().clone(),
                etag: entry.value().etag.clone(),
                generation: entry.value().generation.to_string(),
                size: entry.value().data.len() as u64,
            })
            .collect();
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, RemoteStoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.objects
            .get(key)
            .map(|entry| entry.data.clone())
            .ok_or_else(|| RemoteStoreError::NotFound(key.to_string()))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}
