//! 书籍/章节元数据端点
//!
//! 详情响应带 ETag 头，命中 If-None-Match 时返回 304

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::infrastructure::http::conditional::if_none_match_matches;
use crate::infrastructure::http::dto::{BookDetail, BookItem, ChapterDetail, ChapterItem};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn list_books(State(state): State<AppState>) -> Result<Json<Vec<BookItem>>, ApiError> {
    let catalog = state.catalog.snapshot().await?;
    Ok(Json(catalog.books().map(BookItem::from).collect()))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let catalog = state.catalog.snapshot().await?;
    let book = catalog
        .book(&book_id)
        .ok_or_else(|| ApiError::NotFound(format!("Book not found: {}", book_id)))?;

    respond_with_etag(book.etag.as_deref(), &headers, || {
        Json(BookDetail::from(book)).into_response()
    })
}

pub async fn list_chapters(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> Result<Json<Vec<ChapterItem>>, ApiError> {
    let catalog = state.catalog.snapshot().await?;
    let book = catalog
        .book(&book_id)
        .ok_or_else(|| ApiError::NotFound(format!("Book not found: {}", book_id)))?;

    Ok(Json(
        book.chapters
            .iter()
            .map(|c| ChapterItem::from_parts(&book_id, c))
            .collect(),
    ))
}

pub async fn get_chapter(
    State(state): State<AppState>,
    Path((book_id, chapter_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let catalog = state.catalog.snapshot().await?;
    let chapter = catalog.chapter(&book_id, &chapter_id).ok_or_else(|| {
        ApiError::NotFound(format!("Chapter not found: {}/{}", book_id, chapter_id))
    })?;

    respond_with_etag(chapter.etag.as_deref(), &headers, || {
        Json(ChapterDetail::from_parts(&book_id, chapter)).into_response()
    })
}

fn respond_with_etag(
    etag: Option<&str>,
    headers: &HeaderMap,
    build: impl FnOnce() -> Response,
) -> Result<Response, ApiError> {
    if let Some(etag) = etag {
        if let Some(inm) = headers
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
        {
            if if_none_match_matches(inm, etag) {
                return Response::builder()
                    .status(StatusCode::NOT_MODIFIED)
                    .header(header::ETAG, etag)
                    .body(Body::empty())
                    .map_err(|e| ApiError::Internal(e.to_string()));
            }
        }
    }

    let mut response = build();
    if let Some(etag) = etag {
        if let Ok(value) = etag.parse() {
            response.headers_mut().insert(header::ETAG, value);
        }
    }
    Ok(response)
}
