mod common;

use common::TestApp;
use common::ADMIN_EMAIL;
use identity_service::domain::audit::events::AuditEventType;
use identity_service::domain::user::models::Role;
use reqwest::StatusCode;
use serde_json::json;
use serde_json::Value;

async fn register(app: &TestApp, name: &str, email: &str, password: &str) -> reqwest::Response {
    app.post("/api/auth/register")
        .json(&json!({
            "name": name,
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to execute request")
}

async fn body(response: reqwest::Response) -> Value {
    response.json().await.expect("Failed to parse response")
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").send().await.expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["data"]["status"], "ok");
}

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::spawn().await;

    let response = register(&app, "Ann", "ann@x.com", "Secret1!").await;

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body(response).await;
    assert_eq!(body["status_code"], 201);
    assert_eq!(body["data"]["name"], "Ann");
    assert_eq!(body["data"]["email"], "ann@x.com");
    assert_eq!(body["data"]["role"], "User");
    assert!(body["data"]["id"].is_string());
    assert!(body["data"].get("password").is_none());
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = TestApp::spawn().await;

    let cases = [
        (json!({ "email": "ann@x.com", "password": "Secret1!" }), "user.namerequired"),
        (json!({ "name": "Ann", "password": "Secret1!" }), "user.emailrequired"),
        (
            json!({ "name": "Ann", "email": "ann at x", "password": "Secret1!" }),
            "user.emailinvalid",
        ),
        (json!({ "name": "Ann", "email": "ann@x.com" }), "user.passwordrequired"),
    ];

    for (payload, code) in cases {
        let response = app
            .post("/api/auth/register")
            .json(&payload)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", code);
        assert_eq!(body(response).await["data"]["code"], code);
    }
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::spawn().await;
    register(&app, "Ann", "ann@x.com", "Secret1!").await;

    let response = register(&app, "Another Ann", "ann@x.com", "Other1!").await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body(response).await;
    assert_eq!(body["data"]["code"], "user.emailalreadyexists");
    assert_eq!(body["data"]["message"], "The email is already in use.");
}

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::spawn().await;
    register(&app, "Ann", "ann@x.com", "Secret1!").await;

    let response = app.login("ann@x.com", "Secret1!").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body(response).await;
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert!(!body["data"]["access_token"].as_str().unwrap().is_empty());
    assert!(!body["data"]["refresh_token"].as_str().unwrap().is_empty());
    assert!(body["data"]["expires_at"].is_string());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::spawn().await;
    register(&app, "Ann", "ann@x.com", "Secret1!").await;

    let wrong_password = app.login("ann@x.com", "wrong").await;
    let unknown_email = app.login("nobody@x.com", "Secret1!").await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let wrong_password = body(wrong_password).await;
    let unknown_email = body(unknown_email).await;
    assert_eq!(wrong_password["data"], unknown_email["data"]);
    assert_eq!(wrong_password["data"]["code"], "user.invalidcredentials");
}

#[tokio::test]
async fn test_refresh_rotates_and_detects_reuse() {
    let app = TestApp::spawn().await;
    register(&app, "Ann", "ann@x.com", "Secret1!").await;
    let login = body(app.login("ann@x.com", "Secret1!").await).await;
    let original = login["data"]["refresh_token"].as_str().unwrap().to_string();

    let refreshed = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": original }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(refreshed.status(), StatusCode::OK);
    let rotated = body(refreshed).await["data"]["refresh_token"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(rotated, original);

    let reused = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": original }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(reused.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(reused).await["data"]["code"], "auth.invalidrefreshtoken");

    // Reuse revoked the whole family, including the newest token
    let after_reuse = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": rotated }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(after_reuse.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_requires_token() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/refresh")
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response).await["data"]["code"], "auth.refreshtokenrequired");
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let app = TestApp::spawn().await;
    register(&app, "Ann", "ann@x.com", "Secret1!").await;
    let login = body(app.login("ann@x.com", "Secret1!").await).await;
    let refresh_token = login["data"]["refresh_token"].as_str().unwrap().to_string();

    let logout = app
        .post("/api/auth/logout")
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let refresh = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(refresh.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_user_requires_authentication() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/users")
        .json(&json!({ "name": "Bob", "email": "bob@x.com", "password": "Secret1!" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(response).await["data"]["code"], "auth.unauthorized");
}

#[tokio::test]
async fn test_create_user_requires_permission() {
    let app = TestApp::spawn().await;
    register(&app, "Ann", "ann@x.com", "Secret1!").await;
    let login = body(app.login("ann@x.com", "Secret1!").await).await;
    let token = login["data"]["access_token"].as_str().unwrap();

    let response = app
        .post_authenticated("/api/users", token)
        .json(&json!({ "name": "Bob", "email": "bob@x.com", "password": "Secret1!", "role": "Admin" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body(response).await["data"]["code"], "auth.forbidden");
}

#[tokio::test]
async fn test_admin_creates_admin() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app
        .post_authenticated("/api/users", &token)
        .json(&json!({ "name": "Bob", "email": "bob@x.com", "password": "Secret1!", "role": "Admin" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body(response).await["data"]["role"], "Admin");
}

#[tokio::test]
async fn test_delete_and_restore_workflow() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;
    let ann = body(register(&app, "Ann", "ann@x.com", "Secret1!").await).await;
    let ann_id = ann["data"]["id"].as_str().unwrap().to_string();

    let deleted = app
        .delete_authenticated(&format!("/api/users/{}", ann_id), &admin_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let login = app.login("ann@x.com", "Secret1!").await;
    assert_eq!(login.status(), StatusCode::FORBIDDEN);
    assert_eq!(body(login).await["data"]["code"], "user.deleted");

    let deleted_again = app
        .delete_authenticated(&format!("/api/users/{}", ann_id), &admin_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(deleted_again.status(), StatusCode::CONFLICT);
    assert_eq!(body(deleted_again).await["data"]["code"], "user.alreadydeleted");

    let restored = app
        .post_authenticated(&format!("/api/users/{}/restore", ann_id), &admin_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(restored.status(), StatusCode::NO_CONTENT);

    let restored_again = app
        .post_authenticated(&format!("/api/users/{}/restore", ann_id), &admin_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(restored_again.status(), StatusCode::CONFLICT);
    assert_eq!(body(restored_again).await["data"]["code"], "user.notdeleted");

    assert_eq!(app.login("ann@x.com", "Secret1!").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_user() {
    let app = TestApp::spawn().await;
    let admin_token = app.admin_token().await;
    let ann = body(register(&app, "Ann", "ann@x.com", "Secret1!").await).await;
    let ann_id = ann["data"]["id"].as_str().unwrap().to_string();
    let login = body(app.login("ann@x.com", "Secret1!").await).await;
    let ann_token = login["data"]["access_token"].as_str().unwrap().to_string();

    let unauthenticated = app
        .get(&format!("/api/users/{}", ann_id))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

    let found = app
        .get_authenticated(&format!("/api/users/{}", ann_id), &ann_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(found.status(), StatusCode::OK);
    let found = body(found).await;
    assert_eq!(found["data"]["id"], ann_id.as_str());
    assert_eq!(found["data"]["email"], "ann@x.com");
    assert!(found["data"].get("password_hash").is_none());

    let malformed = app
        .get_authenticated("/api/users/not-a-uuid", &admin_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    app.delete_authenticated(&format!("/api/users/{}", ann_id), &admin_token)
        .send()
        .await
        .expect("Failed to execute request");
    let deleted = app
        .get_authenticated(&format!("/api/users/{}", ann_id), &admin_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(deleted.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(deleted).await["data"]["code"], "user.notfound");
}

#[tokio::test]
async fn test_delete_unknown_and_malformed_ids() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let unknown = app
        .delete_authenticated(&format!("/api/users/{}", uuid::Uuid::new_v4()), &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(unknown).await["data"]["code"], "user.notfound");

    let malformed = app
        .delete_authenticated("/api/users/not-a-uuid", &token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_correlation_id_is_echoed_and_audited() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/register")
        .header("x-correlation-id", "req-42")
        .json(&json!({ "name": "Ann", "email": "ann@x.com", "password": "Secret1!" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(
        response.headers().get("x-correlation-id").and_then(|v| v.to_str().ok()),
        Some("req-42")
    );

    let events = app.services.audit.business_events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, AuditEventType::UserCreated);
    assert_eq!(events[0].correlation_id, "req-42");
}

#[tokio::test]
async fn test_generated_correlation_id() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").send().await.expect("Failed to execute request");

    let header = response
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .expect("correlation id should be set");
    assert!(uuid::Uuid::parse_str(header).is_ok());
}

#[tokio::test]
async fn test_requests_are_security_audited() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    app.delete_authenticated(&format!("/api/users/{}", uuid::Uuid::new_v4()), &token)
        .send()
        .await
        .expect("Failed to execute request");

    let events = app.services.audit.security_events().await;
    let delete = events
        .iter()
        .find(|e| e.method == "DELETE")
        .expect("delete request should be audited");

    assert_eq!(delete.status_code, 404);
    assert_eq!(delete.role, Some(Role::Admin));
    assert!(delete.actor.is_some());
    assert!(delete.permissions.contains(&"users:delete".to_string()));

    let login = events
        .iter()
        .find(|e| e.path == "/api/auth/login")
        .expect("login request should be audited");
    assert!(login.actor.is_none());
    assert_eq!(login.status_code, 200);

    let admin = app
        .services
        .audit
        .business_events()
        .await
        .into_iter()
        .find(|e| e.event_type == AuditEventType::UserLoginSucceeded)
        .expect("login should be audited");
    assert_eq!(admin.metadata_value("email"), Some(ADMIN_EMAIL));
}
