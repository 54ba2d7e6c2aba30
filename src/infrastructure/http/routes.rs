//! 路由定义

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use super::handlers::{assets, books, health, media, tasks, translations};
use super::middleware::{admin_auth, log_errors};
use super::state::AppState;

pub fn create_routes(state: AppState) -> Router {
    let admin = Router::new()
        .route("/tasks", post(tasks::create_task).get(tasks::list_tasks))
        .route("/tasks/:task_id", get(tasks::get_task))
        .route("/tasks/:task_id/log", get(tasks::get_task_log))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth));

    Router::new()
        .route("/health", get(health::health))
        .route("/books", get(books::list_books))
        .route("/books/:book_id", get(books::get_book))
        .route("/books/:book_id/assets", get(assets::list_book_assets))
        .route(
            "/books/:book_id/assets/:asset_name",
            get(assets::book_asset),
        )
        .route(
            "/books/:book_id/chapters",
            get(books::list_chapters),
        )
        .route(
            "/books/:book_id/chapters/:chapter_id",
            get(books::get_chapter),
        )
        .route(
            "/books/:book_id/chapters/:chapter_id/script",
            get(media::chapter_script),
        )
        .route(
            "/books/:book_id/chapters/:chapter_id/audio",
            get(media::chapter_audio),
        )
        .route(
            "/books/:book_id/chapters/:chapter_id/subtitles",
            get(media::chapter_subtitles),
        )
        .route(
            "/books/:book_id/chapters/:chapter_id/assets",
            get(assets::list_chapter_assets),
        )
        .route(
            "/books/:book_id/chapters/:chapter_id/assets/:asset_name",
            get(assets::chapter_asset),
        )
        .route("/translations", post(translations::translate))
        .nest("/admin", admin)
        .layer(middleware::from_fn(log_errors))
        .with_state(state)
}
