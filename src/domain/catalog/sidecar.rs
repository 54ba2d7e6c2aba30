//! Catalog Context - Sidecar Metadata Schema
//!
//! 生成器写出的 JSON sidecar 的类型化 schema。
//! 所有字段均为可选：文件损坏或字段缺失时退化为 None，不进入请求路径报错。

use serde::Deserialize;

/// 书籍元数据（book_metadata.json）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookSidecar {
    /// 展示标题
    pub book_name: Option<String>,
}

/// 章节元数据（metadata.json）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChapterSidecar {
    /// 章节标题
    pub chapter_title: Option<String>,

    /// 章节编号；生成器历史上既写过整数也写过数字字符串
    pub chapter_number: Option<ChapterNumber>,

    /// 脚本词数
    pub word_count: Option<u64>,

    /// 音频时长（秒）
    pub audio_duration_sec: Option<f64>,

    /// 语速（词/分钟）
    pub words_per_minute: Option<f64>,
}

/// 章节编号，兼容整数与数字字符串两种写法
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChapterNumber {
    Int(u32),
    Text(String),
}

impl ChapterNumber {
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            ChapterNumber::Int(n) => Some(*n),
            ChapterNumber::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// 章节派生统计数据
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChapterStats {
    pub word_count: Option<u64>,
    pub audio_duration_sec: Option<f64>,
    pub words_per_minute: Option<f64>,
}

impl From<&ChapterSidecar> for ChapterStats {
    fn from(sidecar: &ChapterSidecar) -> Self {
        Self {
            word_count: sidecar.word_count,
            audio_duration_sec: sidecar.audio_duration_sec,
            words_per_minute: sidecar.words_per_minute,
        }
    }
}
