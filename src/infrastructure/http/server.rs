//! HTTP Server

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;

use super::routes::create_routes;
use super::state::AppState;

/// 请求体上限（翻译文本远小于此）
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// 组装完整应用（测试直接对它发请求）
pub fn build_app(state: AppState) -> Router {
    create_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
}

impl HttpServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// 启动并阻塞直到收到退出信号
    pub async fn run(&self, state: AppState) -> anyhow::Result<()> {
        let app = build_app(state);
        let addr = self.config.addr();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(addr = %addr, "HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown signal handler");
    }
    info!("Shutdown signal received");
}
