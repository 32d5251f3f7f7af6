use axum::extract::{Json, Multipart};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use providers::{ApiError, FileUpload, HttpApi, HttpApiConfig, OfflineApi, TermSheetApi};
use serde_json::json;
use std::fs;
use tempfile::tempdir;
use tokio::net::TcpListener;

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn client(base_url: String) -> HttpApi {
    HttpApi::new(HttpApiConfig {
        base_url,
        request_timeout: None,
    })
    .unwrap()
}

async fn echo_upload(mut multipart: Multipart) -> Json<serde_json::Value> {
    let mut seen = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap();
        seen.push(json!({
            "field": name,
            "fileName": file_name,
            "contentType": content_type,
            "size": bytes.len(),
        }));
    }
    Json(json!({ "status": "valid", "riskScore": 10, "issues": [], "parts": seen }))
}

#[tokio::test]
async fn health_succeeds_on_2xx() {
    let base = serve(Router::new().route("/api/health", get(|| async { "ok" }))).await;
    client(base).health().await.unwrap();
}

#[tokio::test]
async fn health_reports_error_status() {
    let base = serve(Router::new().route(
        "/api/health",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    ))
    .await;
    let err = client(base).health().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 503, .. }), "{err:?}");
}

#[tokio::test]
async fn health_reports_unreachable_backend() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = client(format!("http://{}/api", addr))
        .health()
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unreachable(_)), "{err:?}");
}

#[tokio::test]
async fn base_url_trailing_slash_is_trimmed() {
    let base = serve(Router::new().route("/api/health", get(|| async { "ok" }))).await;
    let api = client(format!("{}/", base));
    assert_eq!(api.base_url(), base);
    api.health().await.unwrap();
}

#[tokio::test]
async fn validate_uploads_file_part() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("deal.pdf");
    fs::write(&path, b"%PDF-1.4 term sheet").unwrap();

    let base = serve(Router::new().route("/api/validate-term-sheet", post(echo_upload))).await;
    let body = client(base)
        .validate(&FileUpload {
            path,
            file_name: "deal.pdf".into(),
            mime: "application/pdf".into(),
        })
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["status"], "valid");
    let parts = parsed["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0]["field"], "file");
    assert_eq!(parts[0]["fileName"], "deal.pdf");
    assert_eq!(parts[0]["contentType"], "application/pdf");
    assert_eq!(parts[0]["size"], 19);
}

#[tokio::test]
async fn validate_returns_raw_body_even_if_not_json() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("deal.txt");
    fs::write(&path, b"terms").unwrap();

    let base = serve(Router::new().route(
        "/api/validate-term-sheet",
        post(|| async { "<html>oops</html>" }),
    ))
    .await;
    let body = client(base)
        .validate(&FileUpload {
            path,
            file_name: "deal.txt".into(),
            mime: "text/plain".into(),
        })
        .await
        .unwrap();
    assert_eq!(body, "<html>oops</html>");
}

#[tokio::test]
async fn validate_maps_server_error() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("deal.txt");
    fs::write(&path, b"terms").unwrap();

    let base = serve(Router::new().route(
        "/api/validate-term-sheet",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    ))
    .await;
    let err = client(base)
        .validate(&FileUpload {
            path,
            file_name: "deal.txt".into(),
            mime: "text/plain".into(),
        })
        .await
        .unwrap_err();
    match err {
        ApiError::Status { status, reason } => {
            assert_eq!(status, 500);
            assert_eq!(reason, "Internal Server Error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn validate_reports_missing_upload() {
    let temp = tempdir().unwrap();
    let base = serve(Router::new()).await;
    let err = client(base)
        .validate(&FileUpload {
            path: temp.path().join("gone.pdf"),
            file_name: "gone.pdf".into(),
            mime: "application/pdf".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Io(_)), "{err:?}");
}

#[tokio::test]
async fn chat_posts_message_and_term_sheet_data() {
    let base = serve(Router::new().route(
        "/api/chat",
        post(|Json(body): Json<serde_json::Value>| async move {
            let reply = format!(
                "{} / {}",
                body["message"].as_str().unwrap_or_default(),
                body["termSheetData"]["riskScore"]
            );
            Json(json!({ "response": reply }))
        }),
    ))
    .await;
    let reply = client(base)
        .chat("how risky?", &json!({ "status": "warning", "riskScore": 45 }))
        .await
        .unwrap();
    assert_eq!(reply.response, "how risky? / 45");
}

#[tokio::test]
async fn chat_rejects_unexpected_body() {
    let base = serve(Router::new().route(
        "/api/chat",
        post(|| async { Json(json!({ "answer": "wrong field" })) }),
    ))
    .await;
    let err = client(base)
        .chat("hello", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn offline_api_is_always_unreachable() {
    let api = OfflineApi;
    assert!(matches!(api.health().await, Err(ApiError::Unreachable(_))));
    assert!(matches!(
        api.chat("hi", &json!({})).await,
        Err(ApiError::Unreachable(_))
    ));
}
