//! 媒体分发端点
//!
//! 本地文件流式输出，支持单区间 Range、If-None-Match/If-Range；
//! redirect 模式（或本地缺失但远端可用时）307 到远端 URL，
//! 字节不经过本进程。

use std::io::SeekFrom;
use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::config::DeliveryMode;
use crate::domain::catalog::{ArtifactKind, ArtifactLocation, Chapter};
use crate::infrastructure::http::conditional::{
    if_none_match_matches, if_range_matches, parse_range, RangeOutcome,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn chapter_script(
    State(state): State<AppState>,
    Path((book_id, chapter_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve_chapter_artifact(&state, &book_id, &chapter_id, ArtifactKind::Script, &headers).await
}

pub async fn chapter_audio(
    State(state): State<AppState>,
    Path((book_id, chapter_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve_chapter_artifact(&state, &book_id, &chapter_id, ArtifactKind::Audio, &headers).await
}

pub async fn chapter_subtitles(
    State(state): State<AppState>,
    Path((book_id, chapter_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    serve_chapter_artifact(
        &state,
        &book_id,
        &chapter_id,
        ArtifactKind::Subtitles,
        &headers,
    )
    .await
}

async fn serve_chapter_artifact(
    state: &AppState,
    book_id: &str,
    chapter_id: &str,
    kind: ArtifactKind,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    let catalog = state.catalog.snapshot().await?;
    let chapter: Chapter = catalog
        .chapter(book_id, chapter_id)
        .cloned()
        .ok_or_else(|| {
            ApiError::NotFound(format!("Chapter not found: {}/{}", book_id, chapter_id))
        })?;
    drop(catalog);

    let location = chapter.artifact(kind);
    if !location.available() {
        return Err(ApiError::NotFound(format!(
            "Chapter {} not generated for {}/{}",
            kind.as_str(),
            book_id,
            chapter_id
        )));
    }

    let mime = match kind {
        ArtifactKind::Script => "text/plain; charset=utf-8",
        ArtifactKind::Subtitles => "text/plain; charset=utf-8",
        ArtifactKind::Audio => chapter.audio_mime.unwrap_or("application/octet-stream"),
    };
    let disposition = match kind {
        ArtifactKind::Subtitles => Some(format!(
            "inline; filename=\"{}_{}.srt\"",
            book_id, chapter_id
        )),
        _ => None,
    };

    deliver(
        location,
        mime,
        chapter.etag.as_deref(),
        headers,
        state.delivery_mode,
        disposition.as_deref(),
    )
    .await
}

/// 统一分发逻辑，资源端点也复用
pub(super) async fn deliver(
    location: &ArtifactLocation,
    mime: &str,
    etag: Option<&str>,
    headers: &HeaderMap,
    mode: DeliveryMode,
    disposition: Option<&str>,
) -> Result<Response, ApiError> {
    if mode == DeliveryMode::Redirect {
        if let Some(url) = &location.remote {
            return redirect(url);
        }
    }
    if let Some(path) = &location.local {
        return serve_file(path, mime, etag, headers, disposition).await;
    }
    // 本地缺失但清单可解析远端位置时仍然可服务
    if let Some(url) = &location.remote {
        return redirect(url);
    }
    Err(ApiError::NotFound("Artifact has no available location".to_string()))
}

fn redirect(url: &str) -> Result<Response, ApiError> {
    debug!(url = %url, "Redirecting to remote object");
    Response::builder()
        .status(StatusCode::TEMPORARY_REDIRECT)
        .header(header::LOCATION, url)
        .body(Body::empty())
        .map_err(|e| ApiError::Internal(e.to_string()))
}

async fn serve_file(
    path: &FsPath,
    mime: &str,
    etag: Option<&str>,
    headers: &HeaderMap,
    disposition: Option<&str>,
) -> Result<Response, ApiError> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound("File vanished during request".to_string())
        } else {
            ApiError::Internal(format!("Failed to stat file: {}", e))
        }
    })?;
    let size = metadata.len();

    // If-None-Match 优先于 Range
    if let (Some(etag), Some(inm)) = (etag, header_str(headers, header::IF_NONE_MATCH)) {
        if if_none_match_matches(inm, etag) {
            return Response::builder()
                .status(StatusCode::NOT_MODIFIED)
                .header(header::ETAG, etag)
                .body(Body::empty())
                .map_err(|e| ApiError::Internal(e.to_string()));
        }
    }

    let mut range = header_str(headers, header::RANGE)
        .map(|h| parse_range(h, size))
        .unwrap_or(RangeOutcome::Full);
    if let Some(if_range) = header_str(headers, header::IF_RANGE) {
        let still_valid = etag
            .map(|tag| if_range_matches(if_range, tag))
            .unwrap_or(false);
        if !still_valid {
            range = RangeOutcome::Full;
        }
    }

    let (status, start, length) = match range {
        RangeOutcome::Unsatisfiable => return Err(ApiError::RangeNotSatisfiable { size }),
        RangeOutcome::Full => (StatusCode::OK, 0, size),
        RangeOutcome::Satisfiable(start, end) => {
            (StatusCode::PARTIAL_CONTENT, start, end - start + 1)
        }
    };

    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to open file: {}", e)))?;
    if start > 0 {
        file.seek(SeekFrom::Start(start))
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to seek file: {}", e)))?;
    }
    let body = Body::from_stream(ReaderStream::new(file.take(length)));

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, mime)
        .header(header::CONTENT_LENGTH, length)
        .header(header::ACCEPT_RANGES, "bytes");
    if status == StatusCode::PARTIAL_CONTENT {
        builder = builder.header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", start, start + length - 1, size),
        );
    }
    if let Some(etag) = etag {
        builder = builder.header(header::ETAG, etag);
    }
    if let Some(disposition) = disposition {
        builder = builder.header(header::CONTENT_DISPOSITION, disposition);
    }
    builder
        .body(body)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
