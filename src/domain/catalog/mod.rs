//! Catalog Context - 内容目录上下文
//!
//! 书籍 → 章节 → 产物/资源的只读投影

mod entities;
mod sidecar;
mod value_objects;

pub use entities::{ArtifactLocation, Asset, Book, Catalog, Chapter};
pub use sidecar::{BookSidecar, ChapterNumber, ChapterSidecar, ChapterStats};
pub use value_objects::{
    guess_mime_type, ArtifactKind, ASSETS_DIR, AUDIO_CANDIDATES, BOOK_SIDECAR_FILE,
    CHAPTER_SIDECAR_FILE, SCRIPT_FILE, SUBTITLE_FILE,
};
