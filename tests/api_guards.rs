// tests/api_guards.rs
// Rotas que respondem antes de qualquer consulta ao banco: guards, validação e assinatura.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use masjid_backend::build_app;

use common::{offline_state, token_for};

fn app() -> (Router, tempfile::TempDir) {
    let (state, dir) = offline_state();
    (build_app(state), dir)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn bearer() -> String {
    format!("Bearer {}", token_for(Uuid::new_v4(), "ahmad@example.com"))
}

#[tokio::test]
async fn health_check_responds_ok() {
    let (app, _dir) = app();
    let request = Request::get("/api/health").body(Body::empty()).unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn user_routes_reject_missing_token_in_client_language() {
    let (app, _dir) = app();
    let request = Request::get("/api/u/me")
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send_json(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication token is invalid or missing.");
}

#[tokio::test]
async fn garbage_token_defaults_to_indonesian_message() {
    let (app, _dir) = app();
    let request = Request::get("/api/u/masjids")
        .header(header::AUTHORIZATION, "Bearer nao.e.um.jwt")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send_json(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token autentikasi tidak valid atau tidak ada.");
}

#[tokio::test]
async fn admin_routes_authenticate_before_resolving_tenant() {
    let (app, _dir) = app();
    let request = Request::get("/api/a/masjid")
        .header("X-Masjid-ID", Uuid::new_v4().to_string())
        .body(Body::empty())
        .unwrap();

    let (status, _) = send_json(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_require_masjid_header() {
    let (app, _dir) = app();
    let request = Request::get("/api/a/teachers")
        .header(header::AUTHORIZATION, bearer())
        .header(header::ACCEPT_LANGUAGE, "en")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send_json(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "The X-Masjid-ID or X-Masjid-Slug header is required.");
}

#[tokio::test]
async fn malformed_masjid_id_header_is_bad_request() {
    let (app, _dir) = app();
    let request = Request::get("/api/a/billings")
        .header(header::AUTHORIZATION, bearer())
        .header(header::ACCEPT_LANGUAGE, "en")
        .header("X-Masjid-ID", "masjid-al-falah")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send_json(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid parameter"));
}

#[tokio::test]
async fn register_reports_field_errors() {
    let (app, _dir) = app();
    let payload = json!({ "email": "bukan-email", "password": "123", "full_name": "" });
    let request = Request::post("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT_LANGUAGE, "en")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let (status, body) = send_json(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = body["details"].as_object().unwrap();
    assert_eq!(details["email"][0], "Invalid e-mail format.");
    assert!(details.contains_key("password"));
    assert!(details.contains_key("full_name"));
}

#[tokio::test]
async fn webhook_with_bad_signature_is_forbidden() {
    let (app, _dir) = app();
    let payload = json!({
        "order_id": "DON-123",
        "transaction_status": "settlement",
        "status_code": "200",
        "gross_amount": "50000.00",
        "signature_key": "forjada"
    });
    let request = Request::post("/public/payments/midtrans/notification")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT_LANGUAGE, "en")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let (status, body) = send_json(app, request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid notification signature.");
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let (app, _dir) = app();
    let body = "--XBOUNDARY\r\n\
                Content-Disposition: form-data; name=\"doc_type\"\r\n\r\n\
                ktp\r\n\
                --XBOUNDARY--\r\n";
    let request = Request::post("/api/u/profile/documents")
        .header(header::AUTHORIZATION, bearer())
        .header(header::ACCEPT_LANGUAGE, "en")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send_json(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid parameter: file");
}

#[tokio::test]
async fn serves_stored_files_under_public_url() {
    let (state, dir) = offline_state();
    std::fs::write(dir.path().join("hello.txt"), "assalamualaikum").unwrap();
    let app = build_app(state);

    let request = Request::get("/uploads/hello.txt").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"assalamualaikum");
}

#[tokio::test]
async fn openapi_document_is_published() {
    let (app, _dir) = app();
    let request = Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap();

    let (status, body) = send_json(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/a/billings"].is_object());
    assert!(body["components"]["securitySchemes"]["api_jwt"].is_object());
}

#[tokio::test]
async fn json_body_missing_field_is_translated_bad_request() {
    let (app, _dir) = app();
    let request = Request::post("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT_LANGUAGE, "en")
        .body(Body::from(json!({ "email": "a@b.com" }).to_string()))
        .unwrap();

    let (status, body) = send_json(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid parameter"));
}

#[tokio::test]
async fn non_numeric_donation_amount_is_bad_request() {
    let (app, _dir) = app();
    let payload = json!({ "donor_name": "Hamba Allah", "amount": "abc" });
    let request = Request::post("/public/masjids/al-falah/donations")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let (status, body) = send_json(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Parameter tidak valid"));
}

#[tokio::test]
async fn malformed_path_uuid_is_json_bad_request() {
    let (app, _dir) = app();
    let request = Request::delete("/api/u/profile/documents/nao-e-uuid")
        .header(header::AUTHORIZATION, bearer())
        .header(header::ACCEPT_LANGUAGE, "en")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send_json(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid parameter"));
}

#[tokio::test]
async fn malformed_query_string_is_json_bad_request() {
    let (app, _dir) = app();
    let request = Request::get("/public/masjids?page=abc")
        .header(header::ACCEPT_LANGUAGE, "en")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send_json(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid parameter"));
}
