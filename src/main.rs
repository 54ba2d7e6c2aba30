//! Fabula Server - 程序入口

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use fabula::application::ports::TaskManagerPort;
use fabula::config::{load_config, print_config, AppConfig};
use fabula::infrastructure::adapters::executor::ProcessTaskExecutor;
use fabula::infrastructure::adapters::remote::HttpRemoteStore;
use fabula::infrastructure::adapters::translate::HttpTranslateClient;
use fabula::infrastructure::catalog::CatalogStore;
use fabula::infrastructure::http::{AppState, HttpServer};
use fabula::infrastructure::memory::InMemoryTaskManager;
use fabula::infrastructure::mirror::RemoteMirror;
use fabula::infrastructure::translation::TranslationCache;
use fabula::infrastructure::worker::TaskWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    init_tracing(&config);
    print_config(&config);

    tokio::fs::create_dir_all(&config.content.data_root)
        .await
        .context("Failed to create content root")?;
    tokio::fs::create_dir_all(&config.tasks.log_root)
        .await
        .context("Failed to create task log root")?;

    let mirror = if config.mirror.enabled {
        let store = Arc::new(
            HttpRemoteStore::new(
                config.mirror.remote_endpoint.clone(),
                Duration::from_secs(config.mirror.timeout_secs),
            )
            .context("Failed to build remote store client")?,
        );
        Some(Arc::new(RemoteMirror::new(
            store,
            config.content.data_root.clone(),
            config.mirror.clone(),
        )))
    } else {
        None
    };

    let catalog = Arc::new(CatalogStore::new(
        config.content.data_root.clone(),
        Duration::from_secs(config.content.refresh_ttl_secs),
        mirror,
    ));

    let translator = match &config.translation.endpoint {
        Some(endpoint) => {
            let client = Arc::new(
                HttpTranslateClient::new(
                    endpoint.clone(),
                    config.translation.api_key.clone(),
                    Duration::from_secs(config.translation.timeout_secs),
                )
                .context("Failed to build translation client")?,
            );
            Some(Arc::new(TranslationCache::new(
                client,
                config.translation.clone(),
            )))
        }
        None => None,
    };

    let (task_manager, queue) = InMemoryTaskManager::new(
        config.tasks.queue_capacity,
        config.tasks.log_root.clone(),
    );
    let task_manager: Arc<dyn TaskManagerPort> = task_manager;
    let executor = Arc::new(ProcessTaskExecutor::new(
        config.content.data_root.clone(),
        config.tasks.clone(),
    ));
    let worker = TaskWorker::new(
        task_manager.clone(),
        executor,
        config.tasks.max_concurrent,
        Some(catalog.clone()),
    );
    let worker_handle = worker.spawn(queue);

    let state = AppState {
        catalog,
        translator,
        task_manager,
        delivery_mode: config.delivery.mode,
        admin_token: config.server.admin_token.clone(),
    };

    let server = HttpServer::new(config.server.clone());
    server.run(state).await?;

    worker_handle.abort();
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},fabula={level},tower_http=debug",
            level = config.log.level
        ))
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
