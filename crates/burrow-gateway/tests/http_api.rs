use std::io::Write;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use burrow_gateway::{App, AppState};
use burrow_generator::RandomGenerator;
use burrow_storage::{FileStore, MemoryStore, ShortToken, Storage};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use tower::ServiceExt;

const BASE_URL: &str = "http://sho.rt";

fn router_with(storage: Arc<dyn Storage>) -> Router {
    App::router(AppState::new(
        storage,
        Arc::new(RandomGenerator::new()),
        BASE_URL,
    ))
}

fn router() -> Router {
    router_with(Arc::new(MemoryStore::new()))
}

fn request(method: &str, uri: &str, owner: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(owner) = owner {
        builder = builder.header(COOKIE, format!("userID={owner}"));
    }
    builder.body(body.into()).unwrap()
}

fn json_request(method: &str, uri: &str, owner: Option<&str>, body: Value) -> Request<Body> {
    let mut request = request(method, uri, owner, body.to_string());
    request
        .headers_mut()
        .insert(CONTENT_TYPE, "application/json".parse().unwrap());
    request
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn token_of(short_url: &str) -> &str {
    short_url.strip_prefix(&format!("{BASE_URL}/")).unwrap()
}

async fn shorten(app: &Router, owner: &str, url: &str) -> String {
    let response = app
        .clone()
        .oneshot(request("POST", "/", Some(owner), url.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_text(response).await
}

#[tokio::test]
async fn shorten_plain_text_issues_cookie() {
    let app = router();

    let response = app
        .oneshot(request("POST", "/", None, "https://example.com"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("userID="));
    assert!(cookie.ends_with("; Path=/"));

    let short_url = body_text(response).await;
    assert_eq!(token_of(&short_url).len(), 6);
}

#[tokio::test]
async fn existing_cookie_is_echoed() {
    let app = router();

    let response = app
        .oneshot(request("POST", "/", Some("AbCdEf"), "https://example.com"))
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(SET_COOKIE).unwrap(),
        "userID=AbCdEf; Path=/"
    );
}

#[tokio::test]
async fn duplicate_url_returns_conflict_with_existing_short_url() {
    let app = router();
    let first = shorten(&app, "alice", "https://example.com").await;

    let response = app
        .oneshot(request("POST", "/", Some("bob"), "https://example.com"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_text(response).await, first);
}

#[tokio::test]
async fn empty_body_is_bad_request() {
    let app = router();

    let response = app
        .oneshot(request("POST", "/", Some("alice"), "  \n"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn redirects_to_original_url() {
    let app = router();
    let short_url = shorten(&app, "alice", "https://example.com/a?b=c").await;

    let response = app
        .oneshot(request("GET", &format!("/{}", token_of(&short_url)), None, Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "https://example.com/a?b=c"
    );
}

#[tokio::test]
async fn malformed_token_is_bad_request() {
    let response = router()
        .oneshot(request("GET", "/abc", None, Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let response = router()
        .oneshot(request("GET", "/ZZZZZZ", None, Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn shorten_json() {
    let app = router();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/shorten",
            Some("alice"),
            json!({ "url": "https://example.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let result = body_json(response).await["result"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(result.starts_with(BASE_URL));

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/shorten",
            Some("alice"),
            json!({ "url": "https://example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["result"], result.as_str());
}

#[tokio::test]
async fn shorten_json_rejects_invalid_body() {
    let response = router()
        .oneshot(request("POST", "/api/shorten", Some("alice"), "{\"link\":1}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn shorten_batch_keeps_correlation_ids() {
    let app = router();
    let existing = shorten(&app, "alice", "https://b.example").await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/shorten/batch",
            Some("alice"),
            json!([
                { "correlation_id": "1", "original_url": "https://a.example" },
                { "correlation_id": "2", "original_url": "https://b.example" },
            ]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let items = body_json(response).await;
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["correlation_id"], "1");
    assert!(items[0]["short_url"].as_str().unwrap().starts_with(BASE_URL));
    assert_eq!(items[1]["correlation_id"], "2");
    assert_eq!(items[1]["short_url"], existing.as_str());
}

#[tokio::test]
async fn empty_batch_is_bad_request() {
    let response = router()
        .oneshot(json_request("POST", "/api/shorten/batch", Some("alice"), json!([])))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_urls_lists_only_own_links() {
    let app = router();
    let a = shorten(&app, "alice", "https://a.example").await;
    shorten(&app, "bob", "https://b.example").await;

    let response = app
        .oneshot(request("GET", "/api/user/urls", Some("alice"), Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!([{ "short_url": a, "original_url": "https://a.example" }])
    );
}

#[tokio::test]
async fn user_without_links_gets_no_content() {
    let response = router()
        .oneshot(request("GET", "/api/user/urls", Some("nobody"), Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn delete_marks_links_gone() {
    let app = router();
    let short_url = shorten(&app, "alice", "https://example.com").await;
    let token = token_of(&short_url).to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/user/urls",
            Some("alice"),
            json!([token.as_str(), "not-a-token"]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = app
        .clone()
        .oneshot(request("GET", &format!("/{token}"), None, Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GONE);

    let response = app
        .oneshot(request("GET", "/api/user/urls", Some("alice"), Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn delete_of_foreign_links_is_ignored() {
    let app = router();
    let short_url = shorten(&app, "alice", "https://example.com").await;
    let token = token_of(&short_url).to_string();

    let response = app
        .clone()
        .oneshot(json_request("DELETE", "/api/user/urls", Some("mallory"), json!([token.as_str()])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = app
        .oneshot(request("GET", &format!("/{token}"), None, Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn deleted_url_can_be_shortened_again() {
    let app = router();
    let first = shorten(&app, "alice", "https://example.com").await;

    app.clone()
        .oneshot(json_request(
            "DELETE",
            "/api/user/urls",
            Some("alice"),
            json!([token_of(&first)]),
        ))
        .await
        .unwrap();

    let second = shorten(&app, "alice", "https://example.com").await;
    assert_ne!(first, second);
}

#[tokio::test]
async fn ping_reports_healthy_storage() {
    let response = router()
        .oneshot(request("GET", "/ping", None, Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn responses_are_gzipped_when_accepted() {
    let app = router();
    shorten(&app, "alice", "https://example.com/a/long/enough/path").await;
    shorten(&app, "alice", "https://example.com/another/long/path").await;

    let mut request = request("GET", "/api/user/urls", Some("alice"), Body::empty());
    request
        .headers_mut()
        .insert(ACCEPT_ENCODING, "gzip".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(CONTENT_ENCODING).unwrap(), "gzip");
}

#[tokio::test]
async fn file_backed_links_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.jsonl");

    let app = router_with(Arc::new(FileStore::open(path.clone()).await.unwrap()));
    let short_url = shorten(&app, "alice", "https://example.com").await;
    drop(app);

    let app = router_with(Arc::new(FileStore::open(path).await.unwrap()));
    let response = app
        .oneshot(request("GET", &format!("/{}", token_of(&short_url)), None, Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers().get(LOCATION).unwrap(), "https://example.com");
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn gzip_request(uri: &str, content_type: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(COOKIE, "userID=alice")
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_ENCODING, "gzip")
        .body(Body::from(gzip(body.as_bytes())))
        .unwrap()
}

#[tokio::test]
async fn gzipped_request_bodies_are_decompressed() {
    let store = Arc::new(MemoryStore::new());
    let app = router_with(store.clone());

    let response = app
        .clone()
        .oneshot(gzip_request("/", "text/plain", "https://gz.example"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let short_url = body_text(response).await;
    let token = ShortToken::parse(token_of(&short_url)).unwrap();
    assert_eq!(store.get(&token).await.unwrap(), "https://gz.example");

    let response = app
        .oneshot(gzip_request(
            "/api/shorten",
            "application/json",
            r#"{"url":"https://gz-json.example"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let result = body_json(response).await["result"]
        .as_str()
        .unwrap()
        .to_string();
    let token = ShortToken::parse(token_of(&result)).unwrap();
    assert_eq!(store.get(&token).await.unwrap(), "https://gz-json.example");
}

#[tokio::test]
async fn urls_are_stored_as_sent() {
    let store = Arc::new(MemoryStore::new());
    let app = router_with(store.clone());

    let short_url = shorten(&app, "alice", " https://ws.example/a b \n").await;

    let token = ShortToken::parse(token_of(&short_url)).unwrap();
    assert_eq!(store.get(&token).await.unwrap(), " https://ws.example/a b \n");
}

#[tokio::test]
async fn ping_fails_when_storage_is_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.jsonl");
    let app = router_with(Arc::new(FileStore::open(path.clone()).await.unwrap()));

    let response = app
        .clone()
        .oneshot(request("GET", "/ping", None, Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    std::fs::remove_file(&path).unwrap();
    let response = app
        .oneshot(request("GET", "/ping", None, Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
