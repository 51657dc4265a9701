//! Integration tests for API endpoints.
//!
//! The router runs against in-memory stores and a throwaway upload
//! directory, so no database is needed.

mod support;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use domain::StoreKind;
use user_store_service::api::middleware::{Claims, TokenVerifier};
use user_store_service::api::uploads::UploadStore;
use user_store_service::api::{create_router, AppState};
use user_store_service::service::RecordService;

use support::{candidate, MemoryStores};

const SECRET: &str = "test-secret-key-for-testing-only-32chars";
const BOUNDARY: &str = "X-TEST-BOUNDARY";

struct TestApp {
    router: Router,
    stores: Arc<MemoryStores>,
    upload_root: PathBuf,
}

impl TestApp {
    fn new() -> Self {
        let stores = MemoryStores::new();
        let upload_root = std::env::temp_dir().join(format!("user-store-test-{}", Uuid::new_v4()));

        let state = AppState::new(
            Arc::new(RecordService::new(stores.clone())),
            Arc::new(TokenVerifier::new(SECRET)),
            Arc::new(UploadStore::new(upload_root.clone())),
            1024 * 1024,
        );

        Self {
            router: create_router(state),
            stores,
            upload_root,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_root);
    }
}

fn token(id: Uuid, role: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: id,
        email: "caller@x.com".to_string(),
        role: role.to_string(),
        exp: now + 3600,
        iat: now,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn admin_token() -> String {
    token(Uuid::new_v4(), "ADMIN")
}

fn json_request(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Build a multipart body from text fields and `(slot, file name, bytes)` files.
fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (slot, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, slot, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let app = TestApp::new();
    let id = app.stores.candidates.seed(candidate("a@x.com"));

    let request = Request::builder()
        .uri(format!("/users/{}", id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = app
        .send(empty_request("GET", &format!("/users/{}", id), "not-a-jwt"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_returns_created_record() {
    let app = TestApp::new();

    let (status, body) = app
        .send(json_request(
            "POST",
            "/users",
            &admin_token(),
            json!({"email": "new@x.com", "password": "long-enough", "role": "EMPLOYER"}),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["kind"], "EMPLOYER");
    assert_eq!(body["email"], "new@x.com");
    assert!(body.get("passwordHash").is_none());
    assert_eq!(app.stores.employers.len(), 1);
}

#[tokio::test]
async fn test_only_privileged_callers_create_admins() {
    let app = TestApp::new();

    let (status, _) = app
        .send(json_request(
            "POST",
            "/users",
            &token(Uuid::new_v4(), "CANDIDATE"),
            json!({"email": "root@x.com", "password": "long-enough", "role": "SUPER_ADMIN"}),
        ))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.stores.total(), 0);
}

#[tokio::test]
async fn test_callers_read_only_their_own_record() {
    let app = TestApp::new();
    let id = app.stores.candidates.seed(candidate("a@x.com"));

    let (status, body) = app
        .send(empty_request("GET", &format!("/users/{}", id), &token(id, "CANDIDATE")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.to_string());

    let (status, _) = app
        .send(empty_request(
            "GET",
            &format!("/stores/candidates/{}", id),
            &token(Uuid::new_v4(), "CANDIDATE"),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_listing_is_privileged() {
    let app = TestApp::new();
    app.stores.candidates.seed(candidate("a@x.com"));
    app.stores.candidates.seed(candidate("b@x.com"));

    let (status, body) = app
        .send(empty_request("GET", "/stores/candidates", &admin_token()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = app
        .send(empty_request("GET", "/stores/candidates", &token(Uuid::new_v4(), "EMPLOYER")))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_store_is_not_found() {
    let app = TestApp::new();

    let (status, _) = app
        .send(empty_request("GET", "/stores/robots", &admin_token()))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_change_returns_new_id() {
    let app = TestApp::new();
    let id = app.stores.candidates.seed(candidate("a@x.com"));

    let (status, body) = app
        .send(json_request(
            "PUT",
            &format!("/stores/candidates/{}", id),
            &admin_token(),
            json!({"role": "EMPLOYER", "skills": "SQL,Go"}),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["migrated"], true);
    assert_eq!(body["kind"], "EMPLOYER");
    let new_id: Uuid = body["newId"].as_str().unwrap().parse().unwrap();
    assert_eq!(body["record"]["skills"], json!(["SQL", "Go"]));

    assert!(app.stores.candidates.get(id).is_none());
    assert_eq!(app.stores.employers.get(new_id).unwrap().kind(), StoreKind::Employer);
}

#[tokio::test]
async fn test_self_service_cannot_change_role_or_flags() {
    let app = TestApp::new();
    let id = app.stores.candidates.seed(candidate("a@x.com"));
    let caller = token(id, "CANDIDATE");

    let (status, _) = app
        .send(json_request(
            "PUT",
            &format!("/stores/candidates/{}", id),
            &caller,
            json!({"role": "ADMIN"}),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(json_request(
            "PUT",
            &format!("/stores/candidates/{}", id),
            &caller,
            json!({"blocked": false}),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(json_request(
            "PUT",
            &format!("/stores/candidates/{}", id),
            &caller,
            json!({"role": "candidate", "name": "Ada L."}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["migrated"], false);
    assert!(body.get("newId").is_none());
    assert_eq!(body["record"]["name"], "Ada L.");
}

#[tokio::test]
async fn test_multipart_update_stores_uploaded_files() {
    let app = TestApp::new();
    let id = app.stores.candidates.seed(candidate("a@x.com"));

    let body = multipart_body(
        &[("education", "BSc|MIT|2020;MA|Oxon|2022")],
        &[
            ("certificates", "bsc.pdf", b"first"),
            ("certificates", "ma.pdf", b"second"),
            ("identityDocument", "", b""),
        ],
    );
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/stores/candidates/{}", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", admin_token()))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    let education = body["record"]["education"].as_array().unwrap();
    assert_eq!(education.len(), 2);

    let first = education[0]["certificate"].as_str().unwrap();
    let second = education[1]["certificate"].as_str().unwrap();
    assert!(first.starts_with("certificates/") && first.ends_with("bsc.pdf"));
    assert!(second.starts_with("certificates/") && second.ends_with("ma.pdf"));
    assert_eq!(std::fs::read(app.upload_root.join(first)).unwrap(), b"first");

    // The empty identity document part is ignored; the stored one stays.
    assert_eq!(
        body["record"]["identityDocument"],
        "identityDocument/passport.pdf"
    );
}

fn multipart_request(uri: &str, token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Files left under one upload slot directory.
fn stored_files(app: &TestApp, slot: &str) -> usize {
    std::fs::read_dir(app.upload_root.join(slot))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_forbidden_upload_writes_no_files() {
    let app = TestApp::new();
    let victim = app.stores.candidates.seed(candidate("a@x.com"));
    let caller = token(Uuid::new_v4(), "CANDIDATE");

    let body = multipart_body(&[("name", "Mallory")], &[("certificates", "x.pdf", b"junk")]);
    let (status, _) = app
        .send(multipart_request(
            &format!("/stores/candidates/{}", victim),
            &caller,
            body,
        ))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(stored_files(&app, "certificates"), 0);
}

#[tokio::test]
async fn test_failed_update_removes_its_uploads() {
    let app = TestApp::new();

    let body = multipart_body(&[], &[("certificates", "x.pdf", b"junk")]);
    let (status, _) = app
        .send(multipart_request(
            &format!("/stores/candidates/{}", Uuid::new_v4()),
            &admin_token(),
            body,
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(stored_files(&app, "certificates"), 0);
}

#[tokio::test]
async fn test_unknown_upload_slot_writes_no_files() {
    let app = TestApp::new();
    let id = app.stores.candidates.seed(candidate("a@x.com"));

    let body = multipart_body(
        &[],
        &[("certificates", "x.pdf", b"ok"), ("avatar", "me.png", b"png")],
    );
    let (status, _) = app
        .send(multipart_request(
            &format!("/stores/candidates/{}", id),
            &admin_token(),
            body,
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(stored_files(&app, "certificates"), 0);
}

#[tokio::test]
async fn test_form_encoded_update_with_indexed_keys() {
    let app = TestApp::new();
    let id = app.stores.candidates.seed(candidate("a@x.com"));

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/stores/candidates/{}", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", admin_token()))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(
            "experience%5B0%5D%5Bcompany%5D=Initech&experience%5B0%5D%5Brole%5D=Analyst&experience%5B1%5D%5Bcompany%5D=Globex",
        ))
        .unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["record"]["experience"],
        json!([
            {"company": "Initech", "role": "Analyst", "years": ""},
            {"company": "Globex", "role": "", "years": ""},
        ])
    );
}

#[tokio::test]
async fn test_delete_is_soft() {
    let app = TestApp::new();
    let id = app.stores.candidates.seed(candidate("a@x.com"));

    let (status, _) = app
        .send(empty_request(
            "DELETE",
            &format!("/stores/candidates/{}", id),
            &token(id, "CANDIDATE"),
        ))
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.stores.candidates.get(id).unwrap().account().deleted);
}

#[tokio::test]
async fn test_review_endpoints() {
    let app = TestApp::new();
    let id = app.stores.candidates.seed(candidate("a@x.com"));
    let entry_id = match app.stores.candidates.get(id).unwrap() {
        domain::UserRecord::Candidate(record) => record.education[0].id,
        _ => unreachable!(),
    };

    let (status, body) = app
        .send(json_request(
            "POST",
            &format!("/stores/candidates/{}/identity-document/review", id),
            &admin_token(),
            json!({"status": "Reject"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identityDocumentStatus"], "Reject");

    let (status, body) = app
        .send(json_request(
            "POST",
            &format!("/stores/candidates/{}/education/{}/review", id, entry_id),
            &admin_token(),
            json!({"status": "Pending"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["education"][0]["status"], "Pending");

    let (status, body) = app
        .send(json_request(
            "POST",
            &format!("/stores/candidates/{}/identity-document/review", id),
            &admin_token(),
            json!({"status": ""}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = app
        .send(json_request(
            "POST",
            &format!("/stores/candidates/{}/identity-document/review", id),
            &token(id, "CANDIDATE"),
            json!({"status": "Approve"}),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
