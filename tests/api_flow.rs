use adreset::{
    api::{router, ClientConfig},
    directory::{Directory, DirectoryError},
    mail::{MailError, Mailer},
    reset::ResetService,
    verification::MemoryStore,
};
use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tower::ServiceExt;

#[derive(Default)]
struct StaticDirectory {
    users: HashMap<String, String>,
    passwords: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn lookup_email(&self, username: &str) -> Result<String, DirectoryError> {
        self.users
            .get(username)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    async fn set_password(
        &self,
        username: &str,
        new_password: &SecretString,
    ) -> Result<(), DirectoryError> {
        if let Ok(mut passwords) = self.passwords.lock() {
            passwords.insert(username.to_string(), new_password.expose_secret().to_string());
        }
        Ok(())
    }
}

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(String, String)>>,
}

impl Outbox {
    fn last(&self) -> Option<(String, String)> {
        self.sent.lock().ok().and_then(|sent| sent.last().cloned())
    }

    fn count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for Outbox {
    async fn send_code(&self, to: &str, code: &str, _ttl: Duration) -> Result<(), MailError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((to.to_string(), code.to_string()));
        }
        Ok(())
    }
}

struct App {
    router: Router,
    directory: Arc<StaticDirectory>,
    outbox: Arc<Outbox>,
}

fn app() -> Result<App> {
    let mut users = HashMap::new();
    users.insert("alice".to_string(), "alice@corp.test".to_string());
    let directory = Arc::new(StaticDirectory {
        users,
        ..StaticDirectory::default()
    });
    let outbox = Arc::new(Outbox::default());
    let store = Arc::new(MemoryStore::new());

    let reset = Arc::new(ResetService::new(
        directory.clone(),
        outbox.clone(),
        store,
    ));
    let client = ClientConfig::new("10.0.0.5", 5001)?;

    Ok(App {
        router: router(reset, client),
        directory,
        outbox,
    })
}

async fn post(router: &Router, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?;
    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 64 * 1024).await?;
    Ok((status, serde_json::from_slice(&bytes)?))
}

#[tokio::test]
async fn code_then_reset_changes_password() -> Result<()> {
    let app = app()?;

    let (status, body) = post(
        &app.router,
        "/api/send-code",
        json!({"username": "alice", "email": "alice@corp.test"}),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "Verification code sent"}));

    let Some((to, code)) = app.outbox.last() else {
        panic!("no code was mailed");
    };
    assert_eq!(to, "alice@corp.test");
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    let reset = json!({
        "username": "alice",
        "email": "alice@corp.test",
        "code": code,
        "new_password": "NewPass1!"
    });
    let (status, body) = post(&app.router, "/api/reset-password", reset.clone()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Password reset successful"));
    assert_eq!(
        app.directory
            .passwords
            .lock()
            .ok()
            .and_then(|p| p.get("alice").cloned()),
        Some("NewPass1!".to_string())
    );

    // Codes are single use.
    let (status, body) = post(&app.router, "/api/reset-password", reset).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    Ok(())
}

#[tokio::test]
async fn missing_fields_are_bad_requests() -> Result<()> {
    let app = app()?;

    let (status, body) = post(&app.router, "/api/send-code", json!({"username": "alice"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "message": "Email address is required"}));

    let (status, body) = post(
        &app.router,
        "/api/reset-password",
        json!({"username": "alice", "email": "alice@corp.test"}),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("All fields are required"));
    assert_eq!(app.outbox.count(), 0);
    Ok(())
}

#[tokio::test]
async fn malformed_body_counts_as_missing_fields() -> Result<()> {
    let app = app()?;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/send-code")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let response = app.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unknown_user_and_wrong_email_are_indistinguishable() -> Result<()> {
    let app = app()?;

    let wrong_email = post(
        &app.router,
        "/api/send-code",
        json!({"username": "alice", "email": "mallory@corp.test"}),
    )
    .await?;
    let unknown_user = post(
        &app.router,
        "/api/send-code",
        json!({"username": "bob", "email": "bob@corp.test"}),
    )
    .await?;

    assert_eq!(wrong_email.0, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(wrong_email, unknown_user);
    assert_eq!(app.outbox.count(), 0);
    Ok(())
}

#[tokio::test]
async fn get_config_advertises_api_base() -> Result<()> {
    let app = app()?;

    let request = Request::builder()
        .uri("/api/get-config")
        .body(Body::empty())?;
    let response = app.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), 64 * 1024).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body, json!({"api_base_url": "http://10.0.0.5:5001/api"}));
    Ok(())
}

#[tokio::test]
async fn health_sets_app_header_and_request_id() -> Result<()> {
    let app = app()?;

    let request = Request::builder().uri("/health").body(Body::empty())?;
    let response = app.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-App"));
    assert!(response.headers().contains_key("x-request-id"));
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let app = app()?;

    let request = Request::builder()
        .uri("/api/openapi.json")
        .body(Body::empty())?;
    let response = app.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), 256 * 1024).await?;
    let body: Value = serde_json::from_slice(&bytes)?;
    assert!(body["paths"]["/api/send-code"].is_object());
    Ok(())
}
