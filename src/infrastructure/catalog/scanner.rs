//! 目录扫描器
//!
//! 将 data_root 下的目录树投影为 Catalog 快照。
//! 阻塞 IO，调用方通过 spawn_blocking 进入。
//!
//! 损坏的 sidecar 只记 warn 并退化为默认值，绝不使请求路径报错。

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::domain::catalog::{
    Asset, ArtifactLocation, Book, BookSidecar, Catalog, Chapter, ChapterSidecar, ChapterStats,
    ASSETS_DIR, AUDIO_CANDIDATES, BOOK_SIDECAR_FILE, CHAPTER_SIDECAR_FILE, SCRIPT_FILE,
    SUBTITLE_FILE,
};

use super::etag::{file_signature, weak_etag};

/// 远端镜像清单中的一个对象
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    /// 公开访问 URL
    pub url: String,
    /// etag:generation:size 指纹，参与 ETag 计算
    pub fingerprint: String,
}

/// 相对路径（`/` 分隔）→ 远端对象
pub type RemoteIndex = HashMap<String, RemoteEntry>;

/// 扫描整棵内容树
///
/// data_root 不存在时返回空 Catalog（部署初期远端尚未同步属正常情况）
pub fn scan_catalog(data_root: &Path, remote: &RemoteIndex) -> std::io::Result<Catalog> {
    if !data_root.is_dir() {
        warn!(path = %data_root.display(), "Content root does not exist, serving empty catalog");
        return Ok(Catalog::default());
    }

    let mut books = BTreeMap::new();
    for entry in fs::read_dir(data_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let book_id = entry.file_name().to_string_lossy().to_string();
        if book_id.starts_with('.') {
            continue;
        }
        let book = scan_book(&entry.path(), &book_id, remote)?;
        books.insert(book_id, book);
    }

    debug!(books = books.len(), "Catalog scan complete");
    Ok(Catalog::new(books))
}

fn scan_book(book_root: &Path, book_id: &str, remote: &RemoteIndex) -> std::io::Result<Book> {
    let mut signatures = Vec::new();

    let sidecar_path = book_root.join(BOOK_SIDECAR_FILE);
    let sidecar = read_sidecar::<BookSidecar>(&sidecar_path);
    if let Ok(metadata) = fs::metadata(&sidecar_path) {
        signatures.push(file_signature(
            &format!("{}/{}", book_id, BOOK_SIDECAR_FILE),
            &metadata,
        ));
    }
    let title = sidecar
        .and_then(|s| s.book_name)
        .unwrap_or_else(|| book_id.to_string());

    let assets = scan_assets(
        &book_root.join(ASSETS_DIR),
        &format!("{}/{}", book_id, ASSETS_DIR),
        remote,
        &mut signatures,
    )?;
    let cover_asset = assets
        .iter()
        .map(|a| a.name.clone())
        .find(|name| name.rsplit_once('.').map(|(stem, _)| stem) == Some("cover"));

    let mut chapters = Vec::new();
    for entry in fs::read_dir(book_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let chapter_id = entry.file_name().to_string_lossy().to_string();
        if chapter_id == ASSETS_DIR || chapter_id.starts_with('.') {
            continue;
        }
        let chapter = scan_chapter(&entry.path(), book_id, &chapter_id, remote)?;
        if let Some(etag) = &chapter.etag {
            signatures.push(format!("{}/{}:{}", book_id, chapter_id, etag));
        }
        chapters.push(chapter);
    }

    // 有编号的章节按编号在前，无编号的按目录名字典序垫底
    chapters.sort_by(|a, b| {
        let ka = (a.number.is_none(), a.number.unwrap_or(u32::MAX), &a.id);
        let kb = (b.number.is_none(), b.number.unwrap_or(u32::MAX), &b.id);
        ka.cmp(&kb)
    });

    signatures.sort();
    let etag = if signatures.is_empty() {
        None
    } else {
        Some(weak_etag(&signatures))
    };

    Ok(Book {
        id: book_id.to_string(),
        title,
        root: book_root.to_path_buf(),
        cover_asset,
        assets,
        chapters,
        etag,
    })
}

fn scan_chapter(
    chapter_root: &Path,
    book_id: &str,
    chapter_id: &str,
    remote: &RemoteIndex,
) -> std::io::Result<Chapter> {
    let rel_prefix = format!("{}/{}", book_id, chapter_id);
    let mut signatures = Vec::new();

    let sidecar_path = chapter_root.join(CHAPTER_SIDECAR_FILE);
    let sidecar = read_sidecar::<ChapterSidecar>(&sidecar_path);
    if let Ok(metadata) = fs::metadata(&sidecar_path) {
        signatures.push(file_signature(
            &format!("{}/{}", rel_prefix, CHAPTER_SIDECAR_FILE),
            &metadata,
        ));
    }

    let title = sidecar
        .as_ref()
        .and_then(|s| s.chapter_title.clone())
        .unwrap_or_else(|| chapter_id.to_string());
    let number = sidecar
        .as_ref()
        .and_then(|s| s.chapter_number.as_ref())
        .and_then(|n| n.as_u32());
    let stats = sidecar
        .as_ref()
        .map(ChapterStats::from)
        .unwrap_or_default();

    let script = locate_artifact(chapter_root, &rel_prefix, SCRIPT_FILE, remote, &mut signatures);
    let subtitles =
        locate_artifact(chapter_root, &rel_prefix, SUBTITLE_FILE, remote, &mut signatures);

    // 按候选优先级取第一个可用的音频文件，本地优先于远端
    let mut audio = ArtifactLocation::default();
    let mut audio_mime = None;
    for (name, mime) in AUDIO_CANDIDATES {
        let candidate = locate_artifact(chapter_root, &rel_prefix, name, remote, &mut signatures);
        if candidate.available() {
            audio = candidate;
            audio_mime = Some(*mime);
            break;
        }
    }

    let assets = scan_assets(
        &chapter_root.join(ASSETS_DIR),
        &format!("{}/{}", rel_prefix, ASSETS_DIR),
        remote,
        &mut signatures,
    )?;

    signatures.sort();
    let etag = if signatures.is_empty() {
        None
    } else {
        Some(weak_etag(&signatures))
    };

    Ok(Chapter {
        id: chapter_id.to_string(),
        title,
        number,
        path: chapter_root.to_path_buf(),
        script,
        audio,
        subtitles,
        audio_mime,
        stats,
        assets,
        etag,
    })
}

/// 定位一个产物：本地文件存在则记录本地路径，远端清单命中则记录远端 URL
fn locate_artifact(
    dir: &Path,
    rel_prefix: &str,
    file_name: &str,
    remote: &RemoteIndex,
    signatures: &mut Vec<String>,
) -> ArtifactLocation {
    let rel_path = format!("{}/{}", rel_prefix, file_name);
    let local_path = dir.join(file_name);

    let local = match fs::metadata(&local_path) {
        Ok(metadata) if metadata.is_file() => {
            signatures.push(file_signature(&rel_path, &metadata));
            Some(local_path)
        }
        _ => None,
    };

    let remote_url = remote.get(&rel_path).map(|entry| {
        if local.is_none() {
            signatures.push(format!("{}:{}", rel_path, entry.fingerprint));
        }
        entry.url.clone()
    });

    ArtifactLocation {
        local,
        remote: remote_url,
    }
}

/// 扫描 assets/ 子目录，与远端清单中同前缀的对象取并集
fn scan_assets(
    assets_dir: &Path,
    rel_prefix: &str,
    remote: &RemoteIndex,
    signatures: &mut Vec<String>,
) -> std::io::Result<Vec<Asset>> {
    // 每个资源各自保留一条签名，本地文件优先于远端指纹
    let mut seen: BTreeMap<String, (ArtifactLocation, Option<String>)> = BTreeMap::new();

    if assets_dir.is_dir() {
        for entry in fs::read_dir(assets_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let rel_path = format!("{}/{}", rel_prefix, name);
            let signature = entry
                .metadata()
                .ok()
                .map(|metadata| file_signature(&rel_path, &metadata));
            if let Some(sig) = &signature {
                signatures.push(sig.clone());
            }
            seen.insert(
                name,
                (
                    ArtifactLocation {
                        local: Some(entry.path()),
                        remote: None,
                    },
                    signature,
                ),
            );
        }
    }

    let dir_prefix = format!("{}/", rel_prefix);
    for (key, entry) in remote {
        if let Some(name) = key.strip_prefix(&dir_prefix) {
            if name.is_empty() || name.contains('/') {
                continue;
            }
            let slot = seen.entry(name.to_string()).or_insert_with(|| {
                let sig = format!("{}:{}", key, entry.fingerprint);
                signatures.push(sig.clone());
                (ArtifactLocation::default(), Some(sig))
            });
            slot.0.remote = Some(entry.url.clone());
        }
    }

    Ok(seen
        .into_iter()
        .map(|(name, (location, signature))| Asset {
            name,
            location,
            etag: signature.map(|sig| weak_etag(&[sig])),
        })
        .collect())
}

fn read_sidecar<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return None,
    };
    match serde_json::from_str(&raw) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to parse sidecar metadata, ignoring");
            None
        }
    }
}
