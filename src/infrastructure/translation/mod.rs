//! Translation Infrastructure - 翻译缓存

pub mod cache;

pub use cache::{Translation, TranslationCache, TranslationCacheError};
