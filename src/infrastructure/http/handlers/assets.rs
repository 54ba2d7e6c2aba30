//! 资源文件端点

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;

use crate::domain::catalog::{guess_mime_type, Asset};
use crate::infrastructure::http::dto::AssetItem;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

use super::media::deliver;

pub async fn list_book_assets(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> Result<Json<Vec<AssetItem>>, ApiError> {
    let catalog = state.catalog.snapshot().await?;
    let book = catalog
        .book(&book_id)
        .ok_or_else(|| ApiError::NotFound(format!("Book not found: {}", book_id)))?;

    Ok(Json(
        book.assets
            .iter()
            .map(|a| AssetItem {
                name: a.name.clone(),
                url: format!("/books/{}/assets/{}", book_id, a.name),
            })
            .collect(),
    ))
}

pub async fn list_chapter_assets(
    State(state): State<AppState>,
    Path((book_id, chapter_id)): Path<(String, String)>,
) -> Result<Json<Vec<AssetItem>>, ApiError> {
    let catalog = state.catalog.snapshot().await?;
    let chapter = catalog.chapter(&book_id, &chapter_id).ok_or_else(|| {
        ApiError::NotFound(format!("Chapter not found: {}/{}", book_id, chapter_id))
    })?;

    Ok(Json(
        chapter
            .assets
            .iter()
            .map(|a| AssetItem {
                name: a.name.clone(),
                url: format!(
                    "/books/{}/chapters/{}/assets/{}",
                    book_id, chapter_id, a.name
                ),
            })
            .collect(),
    ))
}

pub async fn book_asset(
    State(state): State<AppState>,
    Path((book_id, asset_name)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    validate_asset_name(&asset_name)?;
    let catalog = state.catalog.snapshot().await?;
    let asset: Asset = catalog
        .book(&book_id)
        .and_then(|b| b.asset(&asset_name))
        .cloned()
        .ok_or_else(|| {
            ApiError::NotFound(format!("Asset not found: {}/{}", book_id, asset_name))
        })?;
    drop(catalog);

    deliver(
        &asset.location,
        guess_mime_type(&asset.name),
        asset.etag.as_deref(),
        &headers,
        state.delivery_mode,
        None,
    )
    .await
}

pub async fn chapter_asset(
    State(state): State<AppState>,
    Path((book_id, chapter_id, asset_name)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    validate_asset_name(&asset_name)?;
    let catalog = state.catalog.snapshot().await?;
    let asset: Asset = catalog
        .chapter(&book_id, &chapter_id)
        .and_then(|c| c.asset(&asset_name))
        .cloned()
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "Asset not found: {}/{}/{}",
                book_id, chapter_id, asset_name
            ))
        })?;
    drop(catalog);

    deliver(
        &asset.location,
        guess_mime_type(&asset.name),
        asset.etag.as_deref(),
        &headers,
        state.delivery_mode,
        None,
    )
    .await
}

/// 资源名必须是单段文件名
fn validate_asset_name(name: &str) -> Result<(), ApiError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(ApiError::BadRequest(format!("Invalid asset name: {}", name)));
    }
    Ok(())
}
