//! HTTP 共享状态

use std::sync::Arc;

use crate::application::ports::TaskManagerPort;
use crate::config::DeliveryMode;
use crate::infrastructure::catalog::CatalogStore;
use crate::infrastructure::translation::TranslationCache;

/// 应用状态，注入所有 handler
///
/// 远端镜像挂在 CatalogStore 内部，快照刷新时顺带同步
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
    /// None 时翻译端点返回 503
    pub translator: Option<Arc<TranslationCache>>,
    pub task_manager: Arc<dyn TaskManagerPort>,
    pub delivery_mode: DeliveryMode,
    /// None 时管理端点返回 503
    pub admin_token: Option<String>,
}
