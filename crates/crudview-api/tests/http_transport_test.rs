#![allow(clippy::unwrap_used)]
// Integration tests for `HttpTransport` using wiremock.

use std::sync::{Arc, Mutex};

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crudview_api::{
    AntiForgeryToken, Contents, CredentialProvider, EnvelopeShape, Error, FileUpload, HttpMethod,
    HttpTransport, Key, Progress, RequestDescriptor, Transport, Verb,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HttpTransport, Arc<AntiForgeryToken>) {
    let server = MockServer::start().await;
    let token = Arc::new(AntiForgeryToken::with_token(SecretString::from(
        "tok-1".to_owned(),
    )));
    let transport = HttpTransport::with_client(reqwest::Client::new())
        .with_credentials(Arc::clone(&token) as Arc<dyn CredentialProvider>);
    (server, transport, token)
}

fn base(server: &MockServer) -> String {
    format!("{}/api/widgets", server.uri())
}

fn no_progress(_: Progress) {}

// ── Addressing ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_uses_key_path_and_token_header() {
    let (server, transport, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/widgets/read/42"))
        .and(header("__RequestVerificationToken", "tok-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"contents": {"id": 42}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = RequestDescriptor::builder(Verb::Read)
        .base_uri(base(&server))
        .key(Some(Key::from("42")))
        .build()
        .unwrap();

    let ok = transport.send(&request, &no_progress).await.unwrap();
    assert_eq!(ok.status, 200);
    assert_eq!(ok.envelope.shape, EnvelopeShape::Wrapped);
    assert_eq!(ok.envelope.contents, Contents::Single(json!({"id": 42})));
}

#[tokio::test]
async fn test_list_posts_query_with_body_tokens() {
    let (server, transport, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/widgets/list"))
        .and(body_json(json!({
            "keyword": "blue",
            "page": 2,
            "size": 10,
            "__RequestVerificationToken": ["tok-1"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contents": [{"id": 1}, {"id": 2}],
            "total": 23
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = RequestDescriptor::builder(Verb::List)
        .base_uri(base(&server))
        .keyword(Some("blue".into()))
        .page(Some(2))
        .size(Some(10))
        .build()
        .unwrap();

    let ok = transport.send(&request, &no_progress).await.unwrap();
    assert_eq!(ok.envelope.total, Some(23));
    assert_eq!(ok.envelope.contents.len(), 2);
}

#[tokio::test]
async fn test_get_mode_find_uses_path_segments() {
    let (server, transport, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/widgets/find/blue/1/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 9}])))
        .expect(1)
        .mount(&server)
        .await;

    let request = RequestDescriptor::builder(Verb::Find)
        .base_uri(base(&server))
        .keyword(Some("blue".into()))
        .page(Some(1))
        .size(Some(5))
        .method(Some(HttpMethod::Get))
        .build()
        .unwrap();

    let ok = transport.send(&request, &no_progress).await.unwrap();
    assert_eq!(ok.envelope.shape, EnvelopeShape::Bare);
    assert!(ok.envelope.contents.is_many());
}

// ── Tokens ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rotated_token_header_replaces_stored_token() {
    let (server, transport, token) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/widgets/update"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Updated-CSRF-Token", "tok-2")
                .set_body_json(json!({"contents": {"id": 1}})),
        )
        .mount(&server)
        .await;

    let request = RequestDescriptor::builder(Verb::Update)
        .base_uri(base(&server))
        .body(Some(json!({"id": 1})))
        .build()
        .unwrap();
    transport.send(&request, &no_progress).await.unwrap();

    let current = token.current().unwrap();
    assert_eq!(current.expose_secret(), "tok-2");
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_server_error_is_a_failure_with_status() {
    let (server, transport, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/widgets/delete"))
        .respond_with(ResponseTemplate::new(500).set_body_string("kaboom"))
        .mount(&server)
        .await;

    let request = RequestDescriptor::builder(Verb::Delete)
        .base_uri(base(&server))
        .body(Some(json!({"id": 3})))
        .build()
        .unwrap();

    let failure = transport.send(&request, &no_progress).await.unwrap_err();
    assert_eq!(failure.status, Some(500));
    assert_eq!(failure.raw, "kaboom");
    assert!(
        matches!(failure.error, Error::Http { status: 500, .. }),
        "expected Http error, got: {:?}",
        failure.error
    );
}

#[tokio::test]
async fn test_validation_errors_still_succeed_at_transport_level() {
    let (server, transport, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/widgets/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"field": "name", "defaultMessage": "required"}]
        })))
        .mount(&server)
        .await;

    let request = RequestDescriptor::builder(Verb::Create)
        .base_uri(base(&server))
        .body(Some(json!({"name": ""})))
        .build()
        .unwrap();

    let ok = transport.send(&request, &no_progress).await.unwrap();
    assert!(ok.envelope.has_errors());
}

// ── Uploads ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_reports_progress_before_outcome() {
    let (server, transport, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/widgets/CreateFileContent"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"contents": {"id": 7}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = RequestDescriptor::builder(Verb::Create)
        .base_uri(base(&server))
        .target(Some("CreateFileContent".into()))
        .body(Some(json!({"title": "report"})))
        .file(Some(
            FileUpload::new("report.txt", vec![b'x'; 200 * 1024]).with_content_type("text/plain"),
        ))
        .build()
        .unwrap();

    let reports = Mutex::new(Vec::new());
    let sink = |p: Progress| reports.lock().unwrap().push(p);
    let ok = transport.send(&request, &sink).await.unwrap();
    assert_eq!(ok.envelope.contents, Contents::Single(json!({"id": 7})));

    let reports = reports.into_inner().unwrap();
    assert!(!reports.is_empty());
    assert_eq!(reports.last().unwrap().percent, 100);
    assert_eq!(reports.last().unwrap().bytes_total, 200 * 1024);
}

#[tokio::test]
async fn test_upload_from_path_uses_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("invoice.pdf");
    std::fs::write(&file, b"%PDF-1.7").unwrap();

    let upload = FileUpload::from_path(&file).await.unwrap();
    assert_eq!(upload.file_name, "invoice.pdf");
    assert_eq!(upload.len(), 8);

    let missing = FileUpload::from_path(dir.path().join("absent.pdf")).await;
    assert!(matches!(missing, Err(Error::Upload(_))));
}
