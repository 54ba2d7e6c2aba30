//! Remote Mirror - 远端对象镜像
//!
//! 把远端对象存储中的小文件（脚本/字幕/sidecar）同步到本地缓存目录，
//! 大音频留在远端，仅在清单中登记以便重定向分发。
//!
//! 不变量:
//! - 下载经由 `.part` 临时文件 + rename 落盘，读者看不到半成品
//! - 同一前缀的并发同步单飞合并，后到者等待并复用结果
//! - 本地删除（prune）只发生在一次成功列举之后

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::ports::{RemoteObject, RemoteStorePort};
use crate::config::MirrorSettings;
use crate::infrastructure::catalog::scanner::{RemoteEntry, RemoteIndex};

use super::manifest::{Manifest, ManifestEntry, MANIFEST_FILE};

/// Mirror 错误
#[derive(Debug, Error)]
pub enum MirrorError {
    /// 远端不可达，调用方应继续使用现有缓存
    #[error("Remote mirror unavailable: {0}")]
    Unavailable(String),

    #[error("Mirror IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 远端镜像
pub struct RemoteMirror {
    store: Arc<dyn RemoteStorePort>,
    local_root: PathBuf,
    settings: MirrorSettings,
    manifest: std::sync::RwLock<Manifest>,
    /// 前缀 → 单飞闸门
    sync_gates: DashMap<String, Arc<Mutex<()>>>,
    /// 前缀 → 上次成功同步时刻
    last_sync: DashMap<String, Instant>,
}

impl RemoteMirror {
    pub fn new(
        store: Arc<dyn RemoteStorePort>,
        local_root: PathBuf,
        settings: MirrorSettings,
    ) -> Self {
        let manifest = Manifest::load(&local_root.join(MANIFEST_FILE));
        Self {
            store,
            local_root,
            settings,
            manifest: std::sync::RwLock::new(manifest),
            sync_gates: DashMap::new(),
            last_sync: DashMap::new(),
        }
    }

    /// 保证指定前缀在本地不早于 min_sync_interval 之前的远端状态
    ///
    /// 间隔内的重复调用直接返回；并发调用在同一闸门上排队，
    /// 后到者进闸后重查新鲜度，通常无事可做
    pub async fn ensure_fresh(&self, prefix: &str) -> Result<(), MirrorError> {
        if !self.settings.enabled {
            return Ok(());
        }
        if self.is_fresh(prefix) {
            return Ok(());
        }

        let gate = self
            .sync_gates
            .entry(prefix.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = gate.lock().await;

        if self.is_fresh(prefix) {
            return Ok(());
        }

        self.sync_prefix(prefix).await?;
        self.last_sync.insert(prefix.to_string(), Instant::now());
        Ok(())
    }

    fn is_fresh(&self, prefix: &str) -> bool {
        let interval = Duration::from_secs(self.settings.min_sync_interval_secs);
        self.last_sync
            .get(prefix)
            .map(|at| at.elapsed() < interval)
            .unwrap_or(false)
    }

    async fn sync_prefix(&self, prefix: &str) -> Result<(), MirrorError> {
        let objects = self
            .store
            .list(prefix)
            .await
            .map_err(|e| MirrorError::Unavailable(e.to_string()))?;

        let mut downloaded = 0usize;
        let mut skipped = 0usize;
        for object in &objects {
            if !self.should_download(&object.key) {
                continue;
            }
            if self.is_synced(object) {
                skipped += 1;
                continue;
            }
            self.download_object(object).await?;
            downloaded += 1;
        }

        let pruned = self.reconcile_manifest(prefix, &objects)?;

        info!(
            prefix = %prefix,
            listed = objects.len(),
            downloaded,
            skipped,
            pruned,
            "Mirror sync complete"
        );
        Ok(())
    }

    fn should_download(&self, key: &str) -> bool {
        self.settings
            .include_suffixes
            .iter()
            .any(|suffix| key.ends_with(suffix.as_str()))
    }

    /// 指纹未变且本地文件仍在时跳过下载
    fn is_synced(&self, object: &RemoteObject) -> bool {
        let manifest = match self.manifest.read() {
            Ok(manifest) => manifest,
            Err(_) => return false,
        };
        let entry = match manifest.entries.get(&object.key) {
            Some(entry) => entry,
            None => return false,
        };
        entry.fingerprint() == object.fingerprint() && self.local_path(&object.key).is_file()
    }

    async fn download_object(&self, object: &RemoteObject) -> Result<(), MirrorError> {
        let data = self
            .store
            .fetch(&object.key)
            .await
            .map_err(|e| MirrorError::Unavailable(e.to_string()))?;

        let target = self.local_path(&object.key);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = target.with_extension(format!(
            "{}.part",
            target
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_default()
        ));
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &target).await?;

        debug!(key = %object.key, size = object.size, "Mirrored remote object");
        Ok(())
    }

    /// 用成功列举的结果更新清单；prune 开启时删除远端已消失对象的本地副本
    fn reconcile_manifest(
        &self,
        prefix: &str,
        objects: &[RemoteObject],
    ) -> Result<usize, MirrorError> {
        let mut pruned = 0usize;
        {
            let mut manifest = self
                .manifest
                .write()
                .map_err(|_| MirrorError::Unavailable("manifest lock poisoned".to_string()))?;

            let now = chrono::Utc::now();
            let listed: std::collections::HashSet<&str> =
                objects.iter().map(|o| o.key.as_str()).collect();

            let stale: Vec<String> = manifest
                .entries
                .keys()
                .filter(|key| key.starts_with(prefix) && !listed.contains(key.as_str()))
                .cloned()
                .collect();
            for key in stale {
                if self.settings.prune {
                    manifest.entries.remove(&key);
                    let local = self.local_path(&key);
                    if local.is_file() {
                        if let Err(e) = std::fs::remove_file(&local) {
                            warn!(key = %key, error = %e, "Failed to prune local mirror copy");
                        } else {
                            pruned += 1;
                        }
                    }
                }
                // prune 关闭时保留清单项与本地文件
            }

            for object in objects {
                manifest.entries.insert(
                    object.key.clone(),
                    ManifestEntry {
                        etag: object.etag.clone(),
                        generation: object.generation.clone(),
                        size: object.size,
                        synced_at: now,
                    },
                );
            }

            manifest.store(&self.local_root.join(MANIFEST_FILE))?;
        }
        Ok(pruned)
    }

    fn local_path(&self, key: &str) -> PathBuf {
        self.local_root.join(key)
    }

    /// 清单投影为扫描器使用的远端索引
    pub fn remote_index(&self) -> RemoteIndex {
        let manifest = match self.manifest.read() {
            Ok(manifest) => manifest,
            Err(_) => return RemoteIndex::new(),
        };
        manifest
            .entries
            .iter()
            .map(|(key, entry)| {
                (
                    key.clone(),
                    RemoteEntry {
                        url: self.store.public_url(key),
                        fingerprint: entry.fingerprint(),
                    },
                )
            })
            .collect()
    }

    /// 清单已登记对象的公开 URL
    pub fn remote_uri(&self, key: &str) -> Option<String> {
        let manifest = self.manifest.read().ok()?;
        manifest
            .entries
            .contains_key(key)
            .then(|| self.store.public_url(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::remote::MemoryRemoteStore;

    fn settings(prune: bool) -> MirrorSettings {
        MirrorSettings {
            enabled: true,
            remote_endpoint: "http://objects".to_string(),
            include_suffixes: vec![".json".to_string(), ".srt".to_string(), ".txt".to_string()],
            prune,
            min_sync_interval_secs: 0,
            timeout_secs: 5,
        }
    }

    fn seeded_store() -> Arc<MemoryRemoteStore> {
        let store = Arc::new(MemoryRemoteStore::new("http://objects"));
        store.insert("foundation/chapter0/podcast_script.txt", "HOST: welcome");
        store.insert("foundation/chapter0/metadata.json", r#"{"chapter_number": 0}"#);
        store.insert("foundation/chapter0/podcast.wav", vec![0u8; 4096]);
        store
    }

    #[tokio::test]
    async fn test_sync_downloads_only_included_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store();
        let mirror = RemoteMirror::new(store.clone(), dir.path().to_path_buf(), settings(false));

        mirror.ensure_fresh("").await.unwrap();

        assert!(dir
            .path()
            .join("foundation/chapter0/podcast_script.txt")
            .is_file());
        assert!(dir.path().join("foundation/chapter0/metadata.json").is_file());
        // 音频不下载，但清单可解析其远端 URI
        assert!(!dir.path().join("foundation/chapter0/podcast.wav").exists());
        assert_eq!(
            mirror.remote_uri("foundation/chapter0/podcast.wav").as_deref(),
            Some("http://objects/foundation/chapter0/podcast.wav")
        );
    }

    #[tokio::test]
    async fn test_unchanged_objects_are_not_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store();
        let mirror = RemoteMirror::new(store.clone(), dir.path().to_path_buf(), settings(false));

        mirror.ensure_fresh("").await.unwrap();
        let after_first = store.fetch_calls();
        mirror.ensure_fresh("").await.unwrap();
        assert_eq!(store.fetch_calls(), after_first);
    }

    #[tokio::test]
    async fn test_changed_object_is_redownloaded() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store();
        let mirror = RemoteMirror::new(store.clone(), dir.path().to_path_buf(), settings(false));

        mirror.ensure_fresh("").await.unwrap();
        store.insert("foundation/chapter0/podcast_script.txt", "HOST: rewritten");
        mirror.ensure_fresh("").await.unwrap();

        let content = std::fs::read_to_string(
            dir.path().join("foundation/chapter0/podcast_script.txt"),
        )
        .unwrap();
        assert_eq!(content, "HOST: rewritten");
    }

    #[tokio::test]
    async fn test_prune_disabled_keeps_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store();
        let mirror = RemoteMirror::new(store.clone(), dir.path().to_path_buf(), settings(false));

        mirror.ensure_fresh("").await.unwrap();
        store.remove("foundation/chapter0/podcast_script.txt");
        mirror.ensure_fresh("").await.unwrap();

        assert!(dir
            .path()
            .join("foundation/chapter0/podcast_script.txt")
            .is_file());
    }

    #[tokio::test]
    async fn test_prune_enabled_removes_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store();
        let mirror = RemoteMirror::new(store.clone(), dir.path().to_path_buf(), settings(true));

        mirror.ensure_fresh("").await.unwrap();
        store.remove("foundation/chapter0/podcast_script.txt");
        mirror.ensure_fresh("").await.unwrap();

        assert!(!dir
            .path()
            .join("foundation/chapter0/podcast_script.txt")
            .exists());
        assert!(mirror
            .remote_uri("foundation/chapter0/podcast_script.txt")
            .is_none());
    }

    #[tokio::test]
    async fn test_listing_failure_leaves_cache_intact() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store();
        let mirror = RemoteMirror::new(store.clone(), dir.path().to_path_buf(), settings(true));

        mirror.ensure_fresh("").await.unwrap();
        store.set_fail_listing(true);
        let result = mirror.ensure_fresh("").await;

        assert!(matches!(result, Err(MirrorError::Unavailable(_))));
        assert!(dir
            .path()
            .join("foundation/chapter0/podcast_script.txt")
            .is_file());
    }

    #[tokio::test]
    async fn test_min_interval_coalesces_syncs() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store();
        let mut cfg = settings(false);
        cfg.min_sync_interval_secs = 60;
        let mirror = RemoteMirror::new(store.clone(), dir.path().to_path_buf(), cfg);

        mirror.ensure_fresh("").await.unwrap();
        store.insert("foundation/chapter0/podcast_script.txt", "HOST: updated");
        // 间隔内不触发第二次列举
        mirror.ensure_fresh("").await.unwrap();
        let content = std::fs::read_to_string(
            dir.path().join("foundation/chapter0/podcast_script.txt"),
        )
        .unwrap();
        assert_eq!(content, "HOST: welcome");
    }

    #[tokio::test]
    async fn test_disabled_mirror_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store();
        let mut cfg = settings(false);
        cfg.enabled = false;
        let mirror = RemoteMirror::new(store.clone(), dir.path().to_path_buf(), cfg);

        mirror.ensure_fresh("").await.unwrap();
        assert_eq!(store.fetch_calls(), 0);
    }
}
