//! Translate Adapters - 翻译服务实现

pub mod fake_translate_client;
pub mod http_translate_client;

pub use fake_translate_client::FakeTranslateClient;
pub use http_translate_client::HttpTranslateClient;
