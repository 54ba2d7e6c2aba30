//! Catalog Store - 目录快照缓存
//!
//! 持有最近一次扫描的 Catalog 快照，按 TTL 惰性刷新。
//! 刷新在单个闸门内串行执行；扫描走 spawn_blocking，不阻塞 runtime。
//!
//! 镜像启用时，每次刷新前先让镜像追上远端；镜像失败只记 warn，
//! 继续用现有本地缓存重建快照（宁可旧数据也不报错）。

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::application::ApplicationError;
use crate::domain::catalog::Catalog;
use crate::infrastructure::mirror::RemoteMirror;

use super::scanner::{scan_catalog, RemoteIndex};

/// 目录快照缓存
pub struct CatalogStore {
    data_root: PathBuf,
    refresh_ttl: Duration,
    mirror: Option<Arc<RemoteMirror>>,
    snapshot: std::sync::RwLock<Option<(Arc<Catalog>, Instant)>>,
    refresh_gate: tokio::sync::Mutex<()>,
    dirty: AtomicBool,
}

impl CatalogStore {
    pub fn new(
        data_root: PathBuf,
        refresh_ttl: Duration,
        mirror: Option<Arc<RemoteMirror>>,
    ) -> Self {
        Self {
            data_root,
            refresh_ttl,
            mirror,
            snapshot: std::sync::RwLock::new(None),
            refresh_gate: tokio::sync::Mutex::new(()),
            dirty: AtomicBool::new(false),
        }
    }

    /// 获取当前快照，必要时先刷新
    pub async fn snapshot(&self) -> Result<Arc<Catalog>, ApplicationError> {
        if let Some(catalog) = self.fresh_snapshot() {
            return Ok(catalog);
        }

        let _guard = self.refresh_gate.lock().await;
        if let Some(catalog) = self.fresh_snapshot() {
            return Ok(catalog);
        }

        let remote_index = self.refresh_mirror().await;

        let data_root = self.data_root.clone();
        let catalog = tokio::task::spawn_blocking(move || scan_catalog(&data_root, &remote_index))
            .await
            .map_err(|e| ApplicationError::internal(format!("Catalog scan panicked: {}", e)))?
            .map_err(|e| ApplicationError::StorageError(format!("Catalog scan failed: {}", e)))?;

        let catalog = Arc::new(catalog);
        if let Ok(mut slot) = self.snapshot.write() {
            *slot = Some((catalog.clone(), Instant::now()));
        }
        self.dirty.store(false, Ordering::SeqCst);
        debug!(books = catalog.len(), "Catalog snapshot refreshed");
        Ok(catalog)
    }

    /// 标记快照失效，下一次读取强制重扫（任务完成后调用）
    pub fn invalidate(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    fn fresh_snapshot(&self) -> Option<Arc<Catalog>> {
        if self.dirty.load(Ordering::SeqCst) {
            return None;
        }
        let slot = self.snapshot.read().ok()?;
        let (catalog, at) = slot.as_ref()?;
        (at.elapsed() < self.refresh_ttl).then(|| catalog.clone())
    }

    async fn refresh_mirror(&self) -> RemoteIndex {
        let mirror = match &self.mirror {
            Some(mirror) => mirror,
            None => return RemoteIndex::new(),
        };
        if let Err(e) = mirror.ensure_fresh("").await {
            warn!(error = %e, "Mirror sync failed, serving catalog from existing cache");
        }
        mirror.remote_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MirrorSettings;
    use crate::infrastructure::adapters::remote::MemoryRemoteStore;
    use std::fs;
    use std::path::Path;

    fn write_file(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_reflects_tree() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join("foundation/chapter0/podcast_script.txt"),
            b"text",
        );

        let store = CatalogStore::new(dir.path().to_path_buf(), Duration::from_secs(60), None);
        let catalog = store.snapshot().await.unwrap();
        assert!(catalog.chapter("foundation", "chapter0").is_some());
    }

    #[tokio::test]
    async fn test_snapshot_cached_within_ttl() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join("foundation/chapter0/podcast_script.txt"),
            b"text",
        );

        let store = CatalogStore::new(dir.path().to_path_buf(), Duration::from_secs(60), None);
        store.snapshot().await.unwrap();

        write_file(
            &dir.path().join("foundation/chapter1/podcast_script.txt"),
            b"text",
        );
        // TTL 内返回旧快照
        let catalog = store.snapshot().await.unwrap();
        assert!(catalog.chapter("foundation", "chapter1").is_none());
    }

    #[tokio::test]
    async fn test_invalidate_forces_rescan() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join("foundation/chapter0/podcast_script.txt"),
            b"text",
        );

        let store = CatalogStore::new(dir.path().to_path_buf(), Duration::from_secs(60), None);
        store.snapshot().await.unwrap();

        write_file(
            &dir.path().join("foundation/chapter1/podcast_script.txt"),
            b"text",
        );
        store.invalidate();
        let catalog = store.snapshot().await.unwrap();
        assert!(catalog.chapter("foundation", "chapter1").is_some());
    }

    #[tokio::test]
    async fn test_mirror_failure_serves_local_tree() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join("foundation/chapter0/podcast_script.txt"),
            b"text",
        );

        let remote = Arc::new(MemoryRemoteStore::new("http://objects"));
        remote.set_fail_listing(true);
        let mirror = Arc::new(RemoteMirror::new(
            remote,
            dir.path().to_path_buf(),
            MirrorSettings {
                enabled: true,
                remote_endpoint: "http://objects".to_string(),
                min_sync_interval_secs: 0,
                ..MirrorSettings::default()
            },
        ));

        let store = CatalogStore::new(
            dir.path().to_path_buf(),
            Duration::from_secs(60),
            Some(mirror),
        );
        let catalog = store.snapshot().await.unwrap();
        assert!(catalog.chapter("foundation", "chapter0").is_some());
    }

    #[tokio::test]
    async fn test_mirror_supplies_remote_only_audio() {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(MemoryRemoteStore::new("http://objects"));
        remote.insert("foundation/chapter0/podcast_script.txt", "HOST: welcome");
        remote.insert("foundation/chapter0/podcast.wav", vec![0u8; 2048]);

        let mirror = Arc::new(RemoteMirror::new(
            remote,
            dir.path().to_path_buf(),
            MirrorSettings {
                enabled: true,
                remote_endpoint: "http://objects".to_string(),
                min_sync_interval_secs: 0,
                ..MirrorSettings::default()
            },
        ));

        let store = CatalogStore::new(
            dir.path().to_path_buf(),
            Duration::from_secs(60),
            Some(mirror),
        );
        let catalog = store.snapshot().await.unwrap();
        let chapter = catalog.chapter("foundation", "chapter0").unwrap();

        // 脚本已镜像到本地，音频只存在于远端
        assert!(chapter.script.local.is_some());
        assert!(chapter.audio.local.is_none());
        assert_eq!(
            chapter.audio.remote.as_deref(),
            Some("http://objects/foundation/chapter0/podcast.wav")
        );
    }
}
