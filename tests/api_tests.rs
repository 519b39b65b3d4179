use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use docbase::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Credentials seeded by the initial migration.
const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "password";

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

async fn spawn_app() -> (Router, tempfile::TempDir) {
    let (app, _store, upload_dir) = spawn_app_with_store().await;
    (app, upload_dir)
}

/// Variant exposing the backing store for tests that manipulate rows
/// the API offers no route for.
async fn spawn_app_with_store() -> (Router, docbase::db::Store, tempfile::TempDir) {
    let upload_dir = tempfile::tempdir().expect("Failed to create temp upload dir");

    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.storage.upload_path = upload_dir.path().to_string_lossy().into_owned();
    // Single connection keeps the in-memory database shared across queries
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    // Fast Argon2 parameters so tests don't spend seconds hashing
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = docbase::api::create_app_state_from_config(config)
        .await
        .expect("Failed to create app state");
    let store = state.shared.store.clone();
    (docbase::api::router(state).await, store, upload_dir)
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn post_json(
    app: &Router,
    uri: &str,
    payload: &serde_json::Value,
    token: Option<&str>,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    app.clone()
        .oneshot(
            builder
                .body(Body::from(serde_json::to_string(payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn register(app: &Router, username: &str, email: &str, password: &str) {
    let response = post_json(
        app,
        "/api/auth/register",
        &serde_json::json!({ "username": username, "email": email, "password": password }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

async fn login(app: &Router, username: &str, password: &str) -> serde_json::Value {
    let response = post_json(
        app,
        "/api/auth/login",
        &serde_json::json!({ "username": username, "password": password }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

fn multipart_body(file_name: &str, content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload_file(
    app: &Router,
    uri: &str,
    token: &str,
    file_name: &str,
    content_type: &str,
    content: &[u8],
) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Authorization", format!("Bearer {token}"))
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(file_name, content_type, content)))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint_is_public() {
    let (app, _dir) = spawn_app().await;

    let response = get(&app, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_login_and_list_users() {
    let (app, _dir) = spawn_app().await;

    // A role hint in the register payload must be ignored
    let response = post_json(
        &app,
        "/api/auth/register",
        &serde_json::json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "secret123",
            "role": "Admin"
        }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let tokens = login(&app, "alice", "secret123").await;
    assert!(tokens["accessToken"].is_string());
    assert!(tokens["refreshToken"].is_string());
    assert_eq!(tokens["role"], "User");

    let access_token = tokens["accessToken"].as_str().unwrap();

    let response = get(&app, "/api/users", Some(access_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let users = body_json(response).await;
    let alice = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "alice")
        .expect("alice should appear in the user list");
    assert_eq!(alice["role"], "User");

    let response = get(&app, "/api/users", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let (app, _dir) = spawn_app().await;

    register(&app, "bob", "bob@example.com", "secret123").await;

    let response = post_json(
        &app,
        "/api/auth/register",
        &serde_json::json!({
            "username": "bob",
            "email": "other@example.com",
            "password": "secret456"
        }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failure_does_not_reveal_cause() {
    let (app, _dir) = spawn_app().await;

    let wrong_password = post_json(
        &app,
        "/api/auth/login",
        &serde_json::json!({ "username": ADMIN_USERNAME, "password": "nope" }),
        None,
    )
    .await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password_body = wrong_password.into_body().collect().await.unwrap().to_bytes();

    let unknown_user = post_json(
        &app,
        "/api/auth/login",
        &serde_json::json!({ "username": "ghost", "password": "nope" }),
        None,
    )
    .await;
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    let unknown_user_body = unknown_user.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(wrong_password_body, unknown_user_body);
}

#[tokio::test]
async fn test_refresh_rotation_consumes_old_token() {
    let (app, _dir) = spawn_app().await;

    let tokens = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let first_refresh = tokens["refreshToken"].as_str().unwrap().to_string();

    let response = post_json(
        &app,
        "/api/auth/refresh",
        &serde_json::json!({ "refreshToken": first_refresh }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    assert_ne!(rotated["refreshToken"], first_refresh.as_str());

    // The presented token was consumed by the rotation
    let response = post_json(
        &app,
        "/api/auth/refresh",
        &serde_json::json!({ "refreshToken": first_refresh }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_second_login_invalidates_earlier_refresh_token() {
    let (app, _dir) = spawn_app().await;

    let first = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let second = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let response = post_json(
        &app,
        "/api/auth/refresh",
        &serde_json::json!({ "refreshToken": first["refreshToken"] }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json(
        &app,
        "/api/auth/refresh",
        &serde_json::json!({ "refreshToken": second["refreshToken"] }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_or_unparseable_refresh_expiry_rejected() {
    let (app, store, _dir) = spawn_app_with_store().await;

    let tokens = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let refresh_token = tokens["refreshToken"].as_str().unwrap().to_string();
    let admin_id = store
        .get_user_by_username(ADMIN_USERNAME)
        .await
        .unwrap()
        .unwrap()
        .id;

    // Same token, stored expiry in the past
    let past = (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
    store
        .set_refresh_token(admin_id, Some(refresh_token.clone()), Some(past))
        .await
        .unwrap();

    let response = post_json(
        &app,
        "/api/auth/refresh",
        &serde_json::json!({ "refreshToken": refresh_token }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // An expiry that does not parse is treated the same way
    store
        .set_refresh_token(
            admin_id,
            Some(refresh_token.clone()),
            Some("not-a-timestamp".to_string()),
        )
        .await
        .unwrap();

    let response = post_json(
        &app,
        "/api/auth/refresh",
        &serde_json::json!({ "refreshToken": refresh_token }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deactivated_user_rejected_everywhere() {
    use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};

    let (app, store, _dir) = spawn_app_with_store().await;

    register(&app, "hank", "hank@example.com", "secret123").await;
    let tokens = login(&app, "hank", "secret123").await;
    let access_token = tokens["accessToken"].as_str().unwrap().to_string();
    let refresh_token = tokens["refreshToken"].as_str().unwrap().to_string();

    let response = get(&app, "/api/users", Some(&access_token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let user = store.get_user_by_username("hank").await.unwrap().unwrap();
    let mut active = user.into_active_model();
    active.is_active = Set(false);
    active.update(&store.conn).await.unwrap();

    // A still-valid access token no longer passes the bearer gate
    let response = get(&app, "/api/users", Some(&access_token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Neither login nor refresh work for a deactivated account
    let response = post_json(
        &app,
        "/api/auth/login",
        &serde_json::json!({ "username": "hank", "password": "secret123" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json(
        &app,
        "/api/auth/refresh",
        &serde_json::json!({ "refreshToken": refresh_token }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_event_logs_are_role_filtered() {
    let (app, _dir) = spawn_app().await;

    register(&app, "carol", "carol@example.com", "secret123").await;
    let carol = login(&app, "carol", "secret123").await;
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let response = get(
        &app,
        "/api/eventlogs",
        Some(carol["accessToken"].as_str().unwrap()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let carol_logs = body_json(response).await;
    let carol_logs = carol_logs.as_array().unwrap();
    assert!(!carol_logs.is_empty());
    let carol_id = carol_logs[0]["userId"].as_i64().unwrap();
    assert!(carol_logs.iter().all(|l| l["userId"] == carol_id));

    let response = get(
        &app,
        "/api/eventlogs",
        Some(admin["accessToken"].as_str().unwrap()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let admin_logs = body_json(response).await;
    let admin_logs = admin_logs.as_array().unwrap();

    // Admin sees carol's events plus its own login event
    assert!(admin_logs.len() > carol_logs.len());
    assert!(admin_logs.iter().any(|l| l["userId"] != carol_id));
}

#[tokio::test]
async fn test_update_role_requires_admin() {
    let (app, _dir) = spawn_app().await;

    register(&app, "dave", "dave@example.com", "secret123").await;
    let dave = login(&app, "dave", "secret123").await;
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let admin_token = admin["accessToken"].as_str().unwrap();

    let response = get(&app, "/api/users", Some(admin_token)).await;
    let users = body_json(response).await;
    let dave_id = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "dave")
        .unwrap()["id"]
        .as_i64()
        .unwrap();

    // Non-admin cannot change roles, not even their own
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/users/{dave_id}/role"))
                .header(
                    "Authorization",
                    format!("Bearer {}", dave["accessToken"].as_str().unwrap()),
                )
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"role":"Admin"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/users/{dave_id}/role"))
                .header("Authorization", format!("Bearer {admin_token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"role":"Admin"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["role"], "Admin");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/users/99999/role")
                .header("Authorization", format!("Bearer {admin_token}"))
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"role":"User"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_document_upload_download_delete() {
    let (app, _dir) = spawn_app().await;

    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let admin_token = admin["accessToken"].as_str().unwrap();

    let response = upload_file(
        &app,
        "/api/documents/upload",
        admin_token,
        "notes.txt",
        "text/plain",
        b"hello world",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let document = body_json(response).await;
    let document_id = document["id"].as_i64().unwrap();
    assert_eq!(document["fileName"], "notes.txt");
    assert_eq!(document["fileSize"], 11);
    assert_eq!(document["isProcessed"], false);

    let response = get(&app, "/api/documents", Some(admin_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let documents = body_json(response).await;
    assert!(
        documents
            .as_array()
            .unwrap()
            .iter()
            .any(|d| d["id"].as_i64() == Some(document_id))
    );

    let response = get(
        &app,
        &format!("/api/documents/{document_id}/download"),
        Some(admin_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"hello world");

    // Another non-admin user cannot touch it
    register(&app, "eve", "eve@example.com", "secret123").await;
    let eve = login(&app, "eve", "secret123").await;
    let response = get(
        &app,
        &format!("/api/documents/{document_id}/download"),
        Some(eve["accessToken"].as_str().unwrap()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/documents/{document_id}"))
                .header("Authorization", format!("Bearer {admin_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(
        &app,
        &format!("/api/documents/{document_id}/download"),
        Some(admin_token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_user_import() {
    let (app, _dir) = spawn_app().await;

    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let admin_token = admin["accessToken"].as_str().unwrap();

    let csv = "username,email,password,role\n\
               frank,frank@example.com,secret123,User\n\
               admin,dup@example.com,secret123,User\n";

    let response = upload_file(
        &app,
        "/api/documents/upload?type=UserBulk",
        admin_token,
        "users.csv",
        "text/csv",
        csv.as_bytes(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let document = body_json(response).await;

    let errors = document["validationErrors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].as_str().unwrap().starts_with("Line 3:"));
    assert!(errors[0].as_str().unwrap().contains("already exists"));

    let summary: serde_json::Value =
        serde_json::from_str(document["analysisResult"].as_str().unwrap()).unwrap();
    assert_eq!(summary["successCount"], 1);
    assert_eq!(summary["failureCount"], 1);

    // The passing row was inserted despite the failing one
    let tokens = login(&app, "frank", "secret123").await;
    assert_eq!(tokens["role"], "User");
}

#[tokio::test]
async fn test_rejected_bulk_import_persists_nothing() {
    let (app, _dir) = spawn_app().await;

    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let admin_token = admin["accessToken"].as_str().unwrap();

    let response = upload_file(
        &app,
        "/api/documents/upload?type=UserBulk",
        admin_token,
        "users.csv",
        "text/csv",
        &[0xff, 0xfe, 0x00, 0x41],
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The rejected upload must not leave a document row behind
    let response = get(&app, "/api/documents", Some(admin_token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let documents = body_json(response).await;
    assert!(documents.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_bulk_user_import_requires_admin() {
    let (app, _dir) = spawn_app().await;

    register(&app, "grace", "grace@example.com", "secret123").await;
    let grace = login(&app, "grace", "secret123").await;

    let csv = "username,email,password,role\nmallory,m@example.com,pw,Admin\n";

    let response = upload_file(
        &app,
        "/api/documents/upload?type=UserBulk",
        grace["accessToken"].as_str().unwrap(),
        "users.csv",
        "text/csv",
        csv.as_bytes(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Importing as admin never happened
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let response = get(&app, "/api/users", Some(admin["accessToken"].as_str().unwrap())).await;
    let users = body_json(response).await;
    assert!(
        users
            .as_array()
            .unwrap()
            .iter()
            .all(|u| u["username"] != "mallory")
    );
}

#[tokio::test]
async fn test_mock_analysis_classifies_invoice_by_name() {
    let (app, _dir) = spawn_app().await;

    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let admin_token = admin["accessToken"].as_str().unwrap();

    let response = upload_file(
        &app,
        "/api/aianalysis/analyze",
        admin_token,
        "march_invoice.txt",
        "text/plain",
        b"Invoice #42, total 99.50",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert!(body["documentId"].is_i64());
    assert_eq!(body["analysis"]["documentType"], "Invoice");
    assert_eq!(
        body["analysis"]["invoiceData"]["invoiceNumber"],
        "INV-MOCK-001"
    );

    let response = upload_file(
        &app,
        "/api/aianalysis/analyze",
        admin_token,
        "report.txt",
        "text/plain",
        b"Quarterly report contents",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["analysis"]["documentType"], "Information");
    assert_eq!(body["analysis"]["informationData"]["sentiment"], "Neutral");

    // The analyzed document carries the result
    let document_id = body["documentId"].as_i64().unwrap();
    let response = get(&app, "/api/documents", Some(admin_token)).await;
    let documents = body_json(response).await;
    let analyzed = documents
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["id"].as_i64() == Some(document_id))
        .unwrap();
    assert_eq!(analyzed["isProcessed"], true);
    assert!(analyzed["analysisResult"].as_str().unwrap().contains("Information"));
}

#[tokio::test]
async fn test_invalid_bearer_token_rejected() {
    let (app, _dir) = spawn_app().await;

    let response = get(&app, "/api/users", Some("not-a-jwt")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
