//! 镜像清单
//!
//! 记录最近一次成功列举所见的远端对象指纹，持久化在缓存目录根部。
//! 清单是增量同步与远端 URI 解析的唯一真相。

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 清单文件名，位于本地缓存根目录
pub const MANIFEST_FILE: &str = ".mirror_manifest.json";

/// 单个远端对象的同步记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub etag: String,
    pub generation: String,
    pub size: u64,
    pub synced_at: DateTime<Utc>,
}

impl ManifestEntry {
    /// 与 RemoteObject::fingerprint 同构的变更指纹
    pub fn fingerprint(&self) -> String {
        format!("{}:{}:{}", self.etag, self.generation, self.size)
    }
}

/// 清单全量内容，键为对象相对路径
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    /// 从磁盘加载；文件缺失或损坏时从空清单重建（触发一次全量同步）
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt mirror manifest, rebuilding from scratch");
                Self::default()
            }
        }
    }

    /// 原子写出：先写临时文件再 rename
    pub fn store(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.part");
        let payload = serde_json::to_vec_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&tmp, payload)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}
