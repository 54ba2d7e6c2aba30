//! HTTP DTO 定义
//!
//! 资源 URL 一律为本服务的相对路径，客户端自行拼接 base URL；
//! 产物不可用时对应 URL 为 null。

use serde::{Deserialize, Serialize};

use crate::application::ports::{Task, TaskFailure, TaskKind};
use crate::domain::catalog::{Book, Chapter};
use crate::infrastructure::translation::Translation;

/// 书籍列表项
#[derive(Debug, Serialize)]
pub struct BookItem {
    pub id: String,
    pub title: String,
    pub chapter_count: usize,
    pub cover_url: Option<String>,
    pub etag: Option<String>,
}

impl From<&Book> for BookItem {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            title: book.title.clone(),
            chapter_count: book.chapters.len(),
            cover_url: book
                .cover_asset
                .as_ref()
                .map(|name| format!("/books/{}/assets/{}", book.id, name)),
            etag: book.etag.clone(),
        }
    }
}

/// 书籍详情
#[derive(Debug, Serialize)]
pub struct BookDetail {
    pub id: String,
    pub title: String,
    pub cover_url: Option<String>,
    pub assets: Vec<AssetItem>,
    pub chapters: Vec<ChapterItem>,
    pub etag: Option<String>,
}

impl From<&Book> for BookDetail {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            title: book.title.clone(),
            cover_url: book
                .cover_asset
                .as_ref()
                .map(|name| format!("/books/{}/assets/{}", book.id, name)),
            assets: book
                .assets
                .iter()
                .map(|a| AssetItem {
                    name: a.name.clone(),
                    url: format!("/books/{}/assets/{}", book.id, a.name),
                })
                .collect(),
            chapters: book
                .chapters
                .iter()
                .map(|c| ChapterItem::from_parts(&book.id, c))
                .collect(),
            etag: book.etag.clone(),
        }
    }
}

/// 章节列表项
#[derive(Debug, Serialize)]
pub struct ChapterItem {
    pub id: String,
    pub title: String,
    pub number: Option<u32>,
    pub script_available: bool,
    pub audio_available: bool,
    pub subtitles_available: bool,
    pub word_count: Option<u64>,
    pub audio_duration_sec: Option<f64>,
    pub words_per_minute: Option<f64>,
    pub etag: Option<String>,
}

impl ChapterItem {
    pub fn from_parts(_book_id: &str, chapter: &Chapter) -> Self {
        Self {
            id: chapter.id.clone(),
            title: chapter.title.clone(),
            number: chapter.number,
            script_available: chapter.script.available(),
            audio_available: chapter.audio.available(),
            subtitles_available: chapter.subtitles.available(),
            word_count: chapter.stats.word_count,
            audio_duration_sec: chapter.stats.audio_duration_sec,
            words_per_minute: chapter.stats.words_per_minute,
            etag: chapter.etag.clone(),
        }
    }
}

/// 章节详情，含产物 URL
#[derive(Debug, Serialize)]
pub struct ChapterDetail {
    #[serde(flatten)]
    pub chapter: ChapterItem,
    pub script_url: Option<String>,
    pub audio_url: Option<String>,
    pub subtitles_url: Option<String>,
    pub assets: Vec<AssetItem>,
}

impl ChapterDetail {
    pub fn from_parts(book_id: &str, chapter: &Chapter) -> Self {
        let base = format!("/books/{}/chapters/{}", book_id, chapter.id);
        let url_if = |available: bool, suffix: &str| {
            available.then(|| format!("{}/{}", base, suffix))
        };
        Self {
            script_url: url_if(chapter.script.available(), "script"),
            audio_url: url_if(chapter.audio.available(), "audio"),
            subtitles_url: url_if(chapter.subtitles.available(), "subtitles"),
            assets: chapter
                .assets
                .iter()
                .map(|a| AssetItem {
                    name: a.name.clone(),
                    url: format!("{}/assets/{}", base, a.name),
                })
                .collect(),
            chapter: ChapterItem::from_parts(book_id, chapter),
        }
    }
}

/// 资源项
#[derive(Debug, Serialize)]
pub struct AssetItem {
    pub name: String,
    pub url: String,
}

/// 翻译请求体
#[derive(Debug, Deserialize)]
pub struct TranslationRequestBody {
    pub text: String,
    pub target_language: Option<String>,
    pub source_language: Option<String>,
    /// 可选的上下文标识（如 book/chapter/行号），区分不同语境下的同一段文本
    #[serde(default)]
    pub context_keys: Vec<String>,
}

/// 翻译响应
#[derive(Debug, Serialize)]
pub struct TranslationResponse {
    pub translated_text: String,
    pub detected_source_language: Option<String>,
    pub cached: bool,
}

impl From<Translation> for TranslationResponse {
    fn from(t: Translation) -> Self {
        Self {
            translated_text: t.translated_text,
            detected_source_language: t.detected_source_language,
            cached: t.cached,
        }
    }
}

/// 任务创建请求体
#[derive(Debug, Deserialize)]
pub struct TaskCreateRequest {
    pub task_type: TaskKind,
    pub book_id: Option<String>,
    #[serde(default)]
    pub chapters: Vec<String>,
}

/// 任务响应
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub task_type: TaskKind,
    pub status: &'static str,
    pub book_id: String,
    pub chapters: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub result: Option<serde_json::Value>,
    pub error: Option<TaskFailure>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            task_type: task.kind,
            status: task.status.as_str(),
            book_id: task.scope.book_id,
            chapters: task.scope.chapter_ids,
            created_at: task.created_at,
            updated_at: task.updated_at,
            result: task.result,
            error: task.error,
        }
    }
}
