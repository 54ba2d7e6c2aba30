//! Catalog Context - Entities
//!
//! 书籍/章节/资源均为目录扫描的投影，不落库、不持有底层字节。
//! 每次扫描整体重建，实体内部只读。

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::sidecar::ChapterStats;
use super::value_objects::ArtifactKind;

/// 某个产物的位置：本地文件、远端对象，或两者皆有
///
/// 不变量: 可用性 (available) 完全由位置推导，不单独存储
#[derive(Debug, Clone, Default)]
pub struct ArtifactLocation {
    /// 本地文件路径（存在于 data_root 下时）
    pub local: Option<PathBuf>,
    /// 远端对象 URL（镜像清单可解析时）
    pub remote: Option<String>,
}

impl ArtifactLocation {
    pub fn available(&self) -> bool {
        self.local.is_some() || self.remote.is_some()
    }
}

/// 书籍或章节目录下 assets/ 中的一个辅助文件
#[derive(Debug, Clone)]
pub struct Asset {
    /// 文件名（在 assets/ 内唯一）
    pub name: String,
    pub location: ArtifactLocation,
    /// 内容校验器；文件元数据不可读时为 None
    pub etag: Option<String>,
}

/// 章节投影
#[derive(Debug, Clone)]
pub struct Chapter {
    /// 目录名
    pub id: String,
    /// 展示标题（sidecar 缺失时回退为 id）
    pub title: String,
    /// 章节编号（sidecar 提供）
    pub number: Option<u32>,
    /// 章节目录
    pub path: PathBuf,
    pub script: ArtifactLocation,
    pub audio: ArtifactLocation,
    pub subtitles: ArtifactLocation,
    /// 音频 MIME 类型（按候选文件确定）
    pub audio_mime: Option<&'static str>,
    /// 派生统计；sidecar 损坏时全部为 None
    pub stats: ChapterStats,
    pub assets: Vec<Asset>,
    /// 内容校验器；无任何产物时为 None
    pub etag: Option<String>,
}

impl Chapter {
    pub fn artifact(&self, kind: ArtifactKind) -> &ArtifactLocation {
        match kind {
            ArtifactKind::Script => &self.script,
            ArtifactKind::Audio => &self.audio,
            ArtifactKind::Subtitles => &self.subtitles,
        }
    }

    pub fn asset(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// 书籍投影
#[derive(Debug, Clone)]
pub struct Book {
    /// 目录名作为稳定 slug
    pub id: String,
    /// 展示标题（book_metadata.json 的 book_name，回退为 id）
    pub title: String,
    /// 书籍根目录
    pub root: PathBuf,
    /// 封面资源文件名（assets/ 中的 cover.*）
    pub cover_asset: Option<String>,
    pub assets: Vec<Asset>,
    /// 章节列表，已按 (编号, id) 排序
    pub chapters: Vec<Chapter>,
    pub etag: Option<String>,
}

impl Book {
    pub fn chapter(&self, chapter_id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == chapter_id)
    }

    pub fn asset(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// 整棵内容树的一次性快照
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: BTreeMap<String, Book>,
}

impl Catalog {
    pub fn new(books: BTreeMap<String, Book>) -> Self {
        Self { books }
    }

    /// 按 id 字典序迭代
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    pub fn book(&self, book_id: &str) -> Option<&Book> {
        self.books.get(book_id)
    }

    pub fn chapter(&self, book_id: &str, chapter_id: &str) -> Option<&Chapter> {
        self.book(book_id).and_then(|b| b.chapter(chapter_id))
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
