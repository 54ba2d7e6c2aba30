//! HTTP API 集成测试
//!
//! 直接对组装好的 Router 发请求（tower oneshot），不真正监听端口

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use fabula::application::ports::TaskManagerPort;
use fabula::config::{DeliveryMode, MirrorSettings, TranslationSettings};
use fabula::infrastructure::adapters::executor::FakeTaskExecutor;
use fabula::infrastructure::adapters::remote::MemoryRemoteStore;
use fabula::infrastructure::adapters::translate::FakeTranslateClient;
use fabula::infrastructure::catalog::CatalogStore;
use fabula::infrastructure::http::{build_app, AppState};
use fabula::infrastructure::memory::InMemoryTaskManager;
use fabula::infrastructure::mirror::RemoteMirror;
use fabula::infrastructure::translation::TranslationCache;
use fabula::infrastructure::worker::TaskWorker;

const AUDIO_SIZE: usize = 500_000;
const ADMIN_TOKEN: &str = "test-admin-token";

fn write_file(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// foundation/chapter0: 脚本 + 500000 字节音频，无字幕；
/// foundation/chapter1: 脚本 + 字幕
fn sample_tree(root: &Path) {
    write_file(
        &root.join("foundation/book_metadata.json"),
        br#"{"book_name": "Foundation"}"#,
    );
    write_file(&root.join("foundation/assets/cover.jpg"), b"jpegdata");
    write_file(
        &root.join("foundation/chapter0/metadata.json"),
        br#"{"chapter_title": "The Psychohistorians", "chapter_number": 0, "word_count": 2400}"#,
    );
    write_file(
        &root.join("foundation/chapter0/podcast_script.txt"),
        b"HOST: welcome to the show",
    );
    write_file(
        &root.join("foundation/chapter0/podcast.wav"),
        &vec![0x42u8; AUDIO_SIZE],
    );
    write_file(
        &root.join("foundation/chapter1/podcast_script.txt"),
        b"HOST: part two",
    );
    write_file(
        &root.join("foundation/chapter1/subtitles.srt"),
        b"1\n00:00:00,000 --> 00:00:02,000\nwelcome\n",
    );
}

struct TestContext {
    app: Router,
    manager: Arc<InMemoryTaskManager>,
    executor: Arc<FakeTaskExecutor>,
    translator: Arc<FakeTranslateClient>,
    _dir: tempfile::TempDir,
}

fn setup() -> TestContext {
    let dir = tempfile::tempdir().unwrap();
    sample_tree(dir.path());

    let catalog = Arc::new(CatalogStore::new(
        dir.path().to_path_buf(),
        Duration::from_secs(60),
        None,
    ));

    let translator = Arc::new(FakeTranslateClient::new());
    let cache = Arc::new(TranslationCache::new(
        translator.clone(),
        TranslationSettings {
            max_text_chars: 100,
            ..TranslationSettings::default()
        },
    ));

    let (manager, queue) = InMemoryTaskManager::new(32, dir.path().join("task_logs"));
    let executor = Arc::new(FakeTaskExecutor::new());
    let worker = TaskWorker::new(manager.clone(), executor.clone(), 2, Some(catalog.clone()));
    worker.spawn(queue);

    let state = AppState {
        catalog,
        translator: Some(cache),
        task_manager: manager.clone(),
        delivery_mode: DeliveryMode::Local,
        admin_token: Some(ADMIN_TOKEN.to_string()),
    };

    TestContext {
        app: build_app(state),
        manager,
        executor,
        translator,
        _dir: dir,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, HeaderMap, Bytes) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn get_with(
    app: &Router,
    uri: &str,
    header_pairs: &[(header::HeaderName, &str)],
) -> (StatusCode, HeaderMap, Bytes) {
    let mut builder = Request::get(uri);
    for (name, value) in header_pairs {
        builder = builder.header(name, *value);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, HeaderMap, Bytes) {
    send(
        app,
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

fn parse_json(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_health() {
    let ctx = setup();
    let (status, _, body) = get(&ctx.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(&body)["status"], "ok");
}

#[tokio::test]
async fn test_list_books() {
    let ctx = setup();
    let (status, _, body) = get(&ctx.app, "/books").await;
    assert_eq!(status, StatusCode::OK);

    let books = parse_json(&body);
    assert_eq!(books.as_array().unwrap().len(), 1);
    assert_eq!(books[0]["id"], "foundation");
    assert_eq!(books[0]["title"], "Foundation");
    assert_eq!(books[0]["chapter_count"], 2);
    assert_eq!(books[0]["cover_url"], "/books/foundation/assets/cover.jpg");
}

#[tokio::test]
async fn test_chapter_detail_urls_follow_availability() {
    let ctx = setup();
    let (status, headers, body) = get(&ctx.app, "/books/foundation/chapters/chapter0").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key(header::ETAG));

    let detail = parse_json(&body);
    assert_eq!(detail["title"], "The Psychohistorians");
    assert_eq!(detail["word_count"], 2400);
    assert_eq!(detail["audio_available"], true);
    assert_eq!(
        detail["audio_url"],
        "/books/foundation/chapters/chapter0/audio"
    );
    assert_eq!(detail["subtitles_available"], false);
    assert_eq!(detail["subtitles_url"], Value::Null);
}

#[tokio::test]
async fn test_book_asset_listing() {
    let ctx = setup();
    let (status, _, body) = get(&ctx.app, "/books/foundation/assets").await;
    assert_eq!(status, StatusCode::OK);

    let assets = parse_json(&body);
    assert_eq!(assets[0]["name"], "cover.jpg");
    assert_eq!(assets[0]["url"], "/books/foundation/assets/cover.jpg");
}

#[tokio::test]
async fn test_chapter_listing_is_ordered() {
    let ctx = setup();
    let (status, _, body) = get(&ctx.app, "/books/foundation/chapters").await;
    assert_eq!(status, StatusCode::OK);

    let chapters = parse_json(&body);
    let ids: Vec<&str> = chapters
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["chapter0", "chapter1"]);
}

#[tokio::test]
async fn test_unknown_resources_are_404_json() {
    let ctx = setup();
    for uri in [
        "/books/empire",
        "/books/foundation/chapters/chapter9",
        "/books/foundation/chapters/chapter0/subtitles",
    ] {
        let (status, _, body) = get(&ctx.app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "uri: {}", uri);
        assert_eq!(parse_json(&body)["kind"], "not_found", "uri: {}", uri);
    }
}

#[tokio::test]
async fn test_full_audio_download() {
    let ctx = setup();
    let (status, headers, body) = get(&ctx.app, "/books/foundation/chapters/chapter0/audio").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    assert_eq!(
        headers[header::CONTENT_LENGTH],
        AUDIO_SIZE.to_string().as_str()
    );
    assert!(headers.contains_key(header::ETAG));
    assert_eq!(body.len(), AUDIO_SIZE);
}

#[tokio::test]
async fn test_range_request_returns_partial_content() {
    let ctx = setup();
    let (status, headers, body) = get_with(
        &ctx.app,
        "/books/foundation/chapters/chapter0/audio",
        &[(header::RANGE, "bytes=0-99")],
    )
    .await;
    assert_eq!(status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        headers[header::CONTENT_RANGE],
        format!("bytes 0-99/{}", AUDIO_SIZE).as_str()
    );
    assert_eq!(headers[header::CONTENT_LENGTH], "100");
    assert_eq!(body.len(), 100);
}

#[tokio::test]
async fn test_suffix_range() {
    let ctx = setup();
    let (status, headers, body) = get_with(
        &ctx.app,
        "/books/foundation/chapters/chapter0/audio",
        &[(header::RANGE, "bytes=-100")],
    )
    .await;
    assert_eq!(status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        headers[header::CONTENT_RANGE],
        format!("bytes {}-{}/{}", AUDIO_SIZE - 100, AUDIO_SIZE - 1, AUDIO_SIZE).as_str()
    );
    assert_eq!(body.len(), 100);
}

#[tokio::test]
async fn test_out_of_bounds_range_is_416() {
    let ctx = setup();
    let (status, headers, _) = get_with(
        &ctx.app,
        "/books/foundation/chapters/chapter0/audio",
        &[(header::RANGE, "bytes=600000-")],
    )
    .await;
    assert_eq!(status, StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(
        headers[header::CONTENT_RANGE],
        format!("bytes */{}", AUDIO_SIZE).as_str()
    );
}

#[tokio::test]
async fn test_if_none_match_returns_304() {
    let ctx = setup();
    let (_, headers, _) = get(&ctx.app, "/books/foundation/chapters/chapter0/audio").await;
    let etag = headers[header::ETAG].to_str().unwrap().to_string();

    let (status, headers, body) = get_with(
        &ctx.app,
        "/books/foundation/chapters/chapter0/audio",
        &[(header::IF_NONE_MATCH, etag.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::NOT_MODIFIED);
    assert_eq!(headers[header::ETAG].to_str().unwrap(), etag);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_if_none_match_takes_precedence_over_range() {
    let ctx = setup();
    let (_, headers, _) = get(&ctx.app, "/books/foundation/chapters/chapter0/audio").await;
    let etag = headers[header::ETAG].to_str().unwrap().to_string();

    let (status, _, body) = get_with(
        &ctx.app,
        "/books/foundation/chapters/chapter0/audio",
        &[
            (header::IF_NONE_MATCH, etag.as_str()),
            (header::RANGE, "bytes=0-99"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::NOT_MODIFIED);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_etag_stable_across_requests() {
    let ctx = setup();
    let (_, first, _) = get(&ctx.app, "/books/foundation/chapters/chapter0/audio").await;
    let (_, second, _) = get(&ctx.app, "/books/foundation/chapters/chapter0/audio").await;
    assert_eq!(first[header::ETAG], second[header::ETAG]);
}

#[tokio::test]
async fn test_stale_if_range_ignores_range() {
    let ctx = setup();
    let (status, headers, body) = get_with(
        &ctx.app,
        "/books/foundation/chapters/chapter0/audio",
        &[
            (header::RANGE, "bytes=0-99"),
            (header::IF_RANGE, "\"no-longer-valid\""),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!headers.contains_key(header::CONTENT_RANGE));
    assert_eq!(body.len(), AUDIO_SIZE);
}

#[tokio::test]
async fn test_subtitles_download_has_disposition() {
    let ctx = setup();
    let (status, headers, _) =
        get(&ctx.app, "/books/foundation/chapters/chapter1/subtitles").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "inline; filename=\"foundation_chapter1.srt\""
    );
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
}

#[tokio::test]
async fn test_book_asset_served_with_mime() {
    let ctx = setup();
    let (status, headers, body) = get(&ctx.app, "/books/foundation/assets/cover.jpg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(&body[..], b"jpegdata");
}

#[tokio::test]
async fn test_book_asset_supports_conditional_requests() {
    let ctx = setup();
    let (status, headers, _) = get(&ctx.app, "/books/foundation/assets/cover.jpg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    let etag = headers[header::ETAG].to_str().unwrap().to_string();

    let (status, headers, body) = get_with(
        &ctx.app,
        "/books/foundation/assets/cover.jpg",
        &[(header::IF_NONE_MATCH, etag.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::NOT_MODIFIED);
    assert_eq!(headers[header::ETAG].to_str().unwrap(), etag);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_translation_caches_repeat_requests() {
    let ctx = setup();
    let request = json!({"text": "hello", "target_language": "zh-TW"});

    let (status, _, body) = post_json(&ctx.app, "/translations", request.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let first = parse_json(&body);
    assert_eq!(first["translated_text"], "[zh-TW] hello");
    assert_eq!(first["cached"], false);

    let (status, _, body) = post_json(&ctx.app, "/translations", request).await;
    assert_eq!(status, StatusCode::OK);
    let second = parse_json(&body);
    assert_eq!(second["cached"], true);
    assert_eq!(ctx.translator.calls(), 1);
}

#[tokio::test]
async fn test_translation_context_keys_separate_cache_entries() {
    let ctx = setup();
    let with_ctx = |chapter: &str| {
        json!({
            "text": "hello",
            "target_language": "zh-TW",
            "context_keys": ["foundation", chapter],
        })
    };

    let (status, _, body) = post_json(&ctx.app, "/translations", with_ctx("chapter0")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(&body)["cached"], false);

    // 不同 context 的同一段文本不命中
    let (status, _, body) = post_json(&ctx.app, "/translations", with_ctx("chapter1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(&body)["cached"], false);
    assert_eq!(ctx.translator.calls(), 2);

    let (_, _, body) = post_json(&ctx.app, "/translations", with_ctx("chapter0")).await;
    assert_eq!(parse_json(&body)["cached"], true);
    assert_eq!(ctx.translator.calls(), 2);
}

#[tokio::test]
async fn test_translation_rejects_empty_text() {
    let ctx = setup();
    let (status, _, body) = post_json(&ctx.app, "/translations", json!({"text": "  "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse_json(&body)["kind"], "bad_request");
}

#[tokio::test]
async fn test_translation_provider_down_is_503() {
    let ctx = setup();
    ctx.translator.set_fail(true);
    let (status, _, body) = post_json(&ctx.app, "/translations", json!({"text": "hello"})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(parse_json(&body)["kind"], "service_unavailable");
}

#[tokio::test]
async fn test_admin_requires_bearer_token() {
    let ctx = setup();

    let (status, _, body) = get(&ctx.app, "/admin/tasks").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(parse_json(&body)["kind"], "unauthorized");

    let (status, _, body) = get_with(
        &ctx.app,
        "/admin/tasks",
        &[(header::AUTHORIZATION, "Bearer wrong-token")],
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(parse_json(&body)["kind"], "forbidden");

    let auth = format!("Bearer {}", ADMIN_TOKEN);
    let (status, _, _) = get_with(
        &ctx.app,
        "/admin/tasks",
        &[(header::AUTHORIZATION, auth.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_disabled_without_token_config() {
    let dir = tempfile::tempdir().unwrap();
    sample_tree(dir.path());
    let catalog = Arc::new(CatalogStore::new(
        dir.path().to_path_buf(),
        Duration::from_secs(60),
        None,
    ));
    let (manager, _queue) = InMemoryTaskManager::new(8, dir.path().join("task_logs"));
    let app = build_app(AppState {
        catalog,
        translator: None,
        task_manager: manager,
        delivery_mode: DeliveryMode::Local,
        admin_token: None,
    });

    let (status, _, body) = get(&app, "/admin/tasks").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(parse_json(&body)["kind"], "service_unavailable");
}

#[tokio::test]
async fn test_translation_unconfigured_is_503() {
    let dir = tempfile::tempdir().unwrap();
    sample_tree(dir.path());
    let catalog = Arc::new(CatalogStore::new(
        dir.path().to_path_buf(),
        Duration::from_secs(60),
        None,
    ));
    let (manager, _queue) = InMemoryTaskManager::new(8, dir.path().join("task_logs"));
    let app = build_app(AppState {
        catalog,
        translator: None,
        task_manager: manager,
        delivery_mode: DeliveryMode::Local,
        admin_token: None,
    });

    let (status, _, _) = post_json(&app, "/translations", json!({"text": "hello"})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_task_lifecycle_through_api() {
    let ctx = setup();
    let auth = format!("Bearer {}", ADMIN_TOKEN);

    let (status, _, body) = send(
        &ctx.app,
        Request::post("/admin/tasks")
            .header(header::AUTHORIZATION, auth.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({
                    "task_type": "generate_audio",
                    "book_id": "foundation",
                    "chapters": ["chapter0"],
                })
                .to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let created = parse_json(&body);
    assert_eq!(created["status"], "pending");
    let task_id = created["id"].as_str().unwrap().to_string();

    // 等待 worker 跑完
    for _ in 0..200 {
        if ctx.manager.get(&task_id).map(|t| t.status.is_terminal()) == Some(true) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let uri = format!("/admin/tasks/{}", task_id);
    let (status, _, body) = get_with(
        &ctx.app,
        &uri,
        &[(header::AUTHORIZATION, auth.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let fetched = parse_json(&body);
    assert_eq!(fetched["status"], "succeeded");
    assert_eq!(fetched["result"]["chapters"], 1);
    assert_eq!(ctx.executor.executions().len(), 1);

    let uri = format!("/admin/tasks/{}/log", task_id);
    let (status, headers, _) = get_with(
        &ctx.app,
        &uri,
        &[(header::AUTHORIZATION, auth.as_str())],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
}

#[tokio::test]
async fn test_invalid_task_spec_is_400() {
    let ctx = setup();
    let auth = format!("Bearer {}", ADMIN_TOKEN);

    let (status, _, body) = send(
        &ctx.app,
        Request::post("/admin/tasks")
            .header(header::AUTHORIZATION, auth.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({
                    "task_type": "generate_audio",
                    "book_id": "foundation",
                    "chapters": [],
                })
                .to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse_json(&body)["kind"], "bad_request");
}

#[tokio::test]
async fn test_redirect_delivery_for_remote_audio() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(MemoryRemoteStore::new("http://objects"));
    remote.insert("foundation/chapter0/podcast_script.txt", "HOST: welcome");
    remote.insert("foundation/chapter0/podcast.wav", vec![0u8; 2048]);

    let mirror = Arc::new(RemoteMirror::new(
        remote,
        dir.path().to_path_buf(),
        MirrorSettings {
            enabled: true,
            remote_endpoint: "http://objects".to_string(),
            min_sync_interval_secs: 0,
            ..MirrorSettings::default()
        },
    ));
    let catalog = Arc::new(CatalogStore::new(
        dir.path().to_path_buf(),
        Duration::from_secs(60),
        Some(mirror),
    ));
    let (manager, _queue) = InMemoryTaskManager::new(8, dir.path().join("task_logs"));
    let app = build_app(AppState {
        catalog,
        translator: None,
        task_manager: manager,
        delivery_mode: DeliveryMode::Redirect,
        admin_token: None,
    });

    let (status, headers, _) = get(&app, "/books/foundation/chapters/chapter0/audio").await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        headers[header::LOCATION],
        "http://objects/foundation/chapter0/podcast.wav"
    );

    // 已镜像到本地的小文件即便在 redirect 模式下也可直接分发远端 URL
    let (status, headers, _) = get(&app, "/books/foundation/chapters/chapter0/script").await;
    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        headers[header::LOCATION],
        "http://objects/foundation/chapter0/podcast_script.txt"
    );
}
