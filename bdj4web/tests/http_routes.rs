//! Endpoint tests against the full router

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::write::GzEncoder;
use flate2::Compression;
use tower::ServiceExt;

use bdj4web::app::options::{AppOptions, KeyOptions};
use bdj4web::app::state::AppState;
use bdj4web::authn::shared_key::SharedKey;
use bdj4web::errors::WebError;
use bdj4web::report::geo::DisabledLocator;
use bdj4web::server::serve::router;
use bdj4web::storage::layout::StorageLayout;
use bdj4web::upload::notify::{LogNotifier, Notification, Notifier};

const FORM: &str = "application/x-www-form-urlencoded";

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), WebError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

async fn app(dir: &tempfile::TempDir) -> Router {
    app_with_notifier(dir, Arc::new(LogNotifier)).await
}

async fn app_with_notifier(dir: &tempfile::TempDir, notifier: Arc<dyn Notifier>) -> Router {
    let options = AppOptions {
        layout: StorageLayout::new(dir.path()),
        keys: KeyOptions {
            marquee: None,
            support: Some(SharedKey::new("support-key")),
            test: Some(SharedKey::new("test-key")),
        },
        ..Default::default()
    };
    let state = AppState::with_collaborators(&options, notifier, Arc::new(DisabledLocator))
        .await
        .unwrap();
    router(&options.server, Arc::new(state.server_state()))
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, FORM)
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(&dir).await.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("\"service\":\"bdj4web\""));
}

#[tokio::test]
async fn test_marquee_publish_and_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/bdj4marquee.php",
            "tag=floor1&secret=abc&content=Now%20Playing%3A%20Waltz",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");

    let response = app
        .clone()
        .oneshot(get("/bdj4marquee?tag=floor1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert_eq!(headers[header::EXPIRES], "0");
    assert_eq!(body_text(response).await, "Now Playing: Waltz");

    let response = app
        .oneshot(post_form("/bdj4marquee", "tag=floor1&secret=nope&mqdata=x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "NG4");
}

#[tokio::test]
async fn test_marquee_legacy_field_wins() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    let response = app
        .clone()
        .oneshot(post_form("/bdj4marquee", "tag=t&secret=s&content=new&mqdata=old"))
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "OK");

    let response = app.oneshot(get("/bdj4marquee?tag=t")).await.unwrap();
    assert_eq!(body_text(response).await, "old");
}

#[tokio::test]
async fn test_marquee_fetch_unknown_tag() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(&dir)
        .await
        .oneshot(get("/bdj4marquee?tag=none"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "");
}

#[tokio::test]
async fn test_support_multipart_upload() {
    let dir = tempfile::tempdir().unwrap();
    let body = "--BOUNDARY\r\n\
        Content-Disposition: form-data; name=\"key\"\r\n\r\n\
        support-key\r\n\
        --BOUNDARY\r\n\
        Content-Disposition: form-data; name=\"ident\"\r\n\r\n\
        client7\r\n\
        --BOUNDARY\r\n\
        Content-Disposition: form-data; name=\"origfn\"\r\n\r\n\
        data/bdj4.log\r\n\
        --BOUNDARY\r\n\
        Content-Disposition: form-data; name=\"upfile\"; filename=\"bdj4.log\"\r\n\
        Content-Type: application/octet-stream\r\n\r\n\
        log line\r\n\
        --BOUNDARY--\r\n";
    let request = Request::builder()
        .method("POST")
        .uri("/bdj4support.php")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
        .body(Body::from(body))
        .unwrap();

    let response = app(&dir).await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
    assert_eq!(
        std::fs::read(dir.path().join("uploads/client7/data/bdj4.log")).unwrap(),
        b"log line"
    );
}

#[tokio::test]
async fn test_support_bad_key() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(&dir)
        .await
        .oneshot(post_form("/bdj4support", "key=wrong&ident=c1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "NG: authentication failed");
}

#[tokio::test]
async fn test_tester_echo_and_no_directive() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir).await;

    let response = app
        .clone()
        .oneshot(get("/bdj4test.php?key=test-key&testdata=ping"))
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "OKping");

    let response = app
        .clone()
        .oneshot(post_form("/bdj4test", "key=test-key&foo=bar"))
        .await
        .unwrap();
    assert_eq!(
        body_text(response).await,
        "NG: no directive\nkey=***\nfoo=bar\n"
    );

    let response = app
        .oneshot(get("/bdj4test?key=other&testdata=ping"))
        .await
        .unwrap();
    assert_eq!(body_text(response).await, "NG: authentication failed");
}

#[tokio::test]
async fn test_tester_stores_encoded_upload() {
    let dir = tempfile::tempdir().unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let app = app_with_notifier(&dir, notifier.clone()).await;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"hello from the tester\n").unwrap();
    let encoded = BASE64.encode(encoder.finish().unwrap());
    let body = format!(
        "--BOUNDARY\r\n\
        Content-Disposition: form-data; name=\"key\"\r\n\r\n\
        test-key\r\n\
        --BOUNDARY\r\n\
        Content-Disposition: form-data; name=\"upfile\"; filename=\"support.txt.gz.b64\"\r\n\
        Content-Type: application/octet-stream\r\n\r\n\
        {encoded}\r\n\
        --BOUNDARY--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/bdj4test.php")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");

    let test_dir = dir.path().join("testupload");
    assert_eq!(
        std::fs::read(test_dir.join("support.txt")).unwrap(),
        b"hello from the tester\n"
    );
    let names: Vec<String> = std::fs::read_dir(&test_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["support.txt".to_string()]);
    assert!(notifier.sent.lock().unwrap().is_empty());
    assert!(!dir.path().join("uploads/support.txt").exists());
}

#[tokio::test]
async fn test_report_empty() {
    let dir = tempfile::tempdir().unwrap();
    let response = app(&dir).await.oneshot(get("/bdj4report")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(body_text(response).await.contains("<th align=\"left\">Version</th>"));
}

#[tokio::test]
async fn test_report_reads_telemetry_log() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("bdj4info.txt"),
        "===BEGIN\n-version\n4.3.2\n-releaselevel\nproduction\n-builddate\n20230105\n-new\n1\n===END\n",
    )
    .unwrap();

    let response = app(&dir).await.oneshot(get("/bdj4report.php")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("4.3.2-production-20230105"));
}
