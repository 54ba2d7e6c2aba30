//! Catalog Context - Value Objects
//!
//! 内容目录的固定文件布局约定：
//! `root/{book}/book_metadata.json`
//! `root/{book}/assets/*`
//! `root/{book}/{chapter}/{podcast_script.txt, podcast.wav|mp3|m4a, subtitles.srt, metadata.json}`
//! `root/{book}/{chapter}/assets/*`

use serde::{Deserialize, Serialize};

/// 书籍元数据文件名
pub const BOOK_SIDECAR_FILE: &str = "book_metadata.json";

/// 章节元数据文件名
pub const CHAPTER_SIDECAR_FILE: &str = "metadata.json";

/// 脚本文件名
pub const SCRIPT_FILE: &str = "podcast_script.txt";

/// 字幕文件名
pub const SUBTITLE_FILE: &str = "subtitles.srt";

/// 资源子目录名（书籍与章节目录下保留）
pub const ASSETS_DIR: &str = "assets";

/// 音频候选文件，按优先级排列
pub const AUDIO_CANDIDATES: &[(&str, &str)] = &[
    ("podcast.wav", "audio/wav"),
    ("podcast.mp3", "audio/mpeg"),
    ("podcast.m4a", "audio/mp4"),
];

/// 章节产物类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Script,
    Audio,
    Subtitles,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Script => "script",
            ArtifactKind::Audio => "audio",
            ArtifactKind::Subtitles => "subtitles",
        }
    }
}

/// 根据文件扩展名猜测 MIME 类型
pub fn guess_mime_type(name: &str) -> &'static str {
    let ext = name.rsplit('.').next().unwrap_or_default().to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "srt" => "text/plain; charset=utf-8",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        _ => "application/octet-stream",
    }
}
