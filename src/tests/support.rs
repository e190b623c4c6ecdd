//! Shared setup for the API tests: a real router over a temporary SQLite file,
//! with mail captured in memory and reCAPTCHA faked.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Map, Value};
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions};
use tempfile::{NamedTempFile, TempDir};
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::middleware::csrf::CSRF_HEADER;
use crate::repository::users;
use crate::services::mail::{MailError, Mailer, OutgoingMail};
use crate::services::recaptcha::RecaptchaVerifier;
use crate::state::AppState;
use crate::types::NewUser;

pub const CSRF_SECRET: &str = "csrf-test-secret";
pub const JWT_SECRET: &str = "jwt-test-secret";
/// Token the fake reCAPTCHA verifier accepts.
pub const GOOD_CAPTCHA: &str = "human";

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

pub struct FakeRecaptcha;

#[async_trait]
impl RecaptchaVerifier for FakeRecaptcha {
    async fn verify(&self, token: &str) -> anyhow::Result<bool> {
        Ok(token == GOOD_CAPTCHA)
    }
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    pub uploads: TempDir,
    _db: NamedTempFile,
}

pub fn test_config(db_url: &str, uploads_dir: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = db_url.to_string();
    config.auth.jwt_secret = JWT_SECRET.to_string();
    config.auth.bcrypt_cost = 4;
    config.csrf.secret = Some(CSRF_SECRET.to_string());
    config.uploads.dir = uploads_dir.to_string();
    config.uploads.max_bytes = 64 * 1024;
    config
}

pub async fn setup_test_app() -> TestApp {
    let temp_db = NamedTempFile::new().unwrap();
    let db_url = format!("sqlite:{}", temp_db.path().display());
    sqlx::Sqlite::create_database(&db_url).await.unwrap();

    let pool = SqlitePoolOptions::new().max_connections(1).connect(&db_url).await.unwrap();
    crate::db::init_db(&pool).await.unwrap();

    let uploads = tempfile::tempdir().unwrap();
    let config = test_config(&db_url, &uploads.path().display().to_string());

    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(pool, config)
        .unwrap()
        .with_mailer(mailer.clone())
        .with_recaptcha(Arc::new(FakeRecaptcha));
    let app = crate::app::build_router(state.clone());

    TestApp { app, state, mailer, uploads, _db: temp_db }
}

impl TestApp {
    /// Sends one request and returns the status plus the parsed JSON body
    /// (`Value::Null` when the body is empty).
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body).unwrap() };
        (status, json)
    }

    /// Creates a verified user directly and returns its id and a session token.
    pub async fn seed_user(&self, username: &str, roles: &[&str]) -> (i64, String) {
        let user = NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "unused".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            avatar: None,
            email_token: format!("token-{}", username),
        };
        let id = users::save(&self.state.db, &user).await.unwrap();
        users::mark_verified(&self.state.db, id).await.unwrap();

        let mut claims = Map::new();
        claims.insert("id".into(), json!(id));
        claims.insert("email".into(), json!(user.email));
        claims.insert("role".into(), json!(user.roles));
        (id, self.state.tokens.issue(claims))
    }

    /// Creates an article through the API and returns its JSON.
    pub async fn create_article(&self, token: &str, body: Value) -> Value {
        let (status, json) = self.send(api(Method::POST, "/api/articles").bearer(token).json(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", json);
        json["data"].clone()
    }

    pub async fn article_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM article").fetch_one(&self.state.db).await.unwrap()
    }
}

/// Request builder that adds the CSRF header to mutating requests by default.
pub struct ApiRequest {
    builder: axum::http::request::Builder,
}

pub fn api(method: Method, uri: &str) -> ApiRequest {
    let mutating = method != Method::GET && method != Method::OPTIONS;
    let mut builder = Request::builder().method(method).uri(uri);
    if mutating {
        builder = builder.header(CSRF_HEADER, CSRF_SECRET);
    }
    ApiRequest { builder }
}

/// Same as [`api`] but without the CSRF header.
pub fn api_without_csrf(method: Method, uri: &str) -> ApiRequest {
    ApiRequest { builder: Request::builder().method(method).uri(uri) }
}

impl ApiRequest {
    pub fn bearer(mut self, token: &str) -> Self {
        self.builder = self.builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    pub fn json(self, body: Value) -> Request<Body> {
        self.builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn raw(self, content_type: &str, body: impl Into<Body>) -> Request<Body> {
        self.builder.header(header::CONTENT_TYPE, content_type).body(body.into()).unwrap()
    }

    pub fn empty(self) -> Request<Body> {
        self.builder.body(Body::empty()).unwrap()
    }
}

pub const MULTIPART_BOUNDARY: &str = "infodot-test-boundary";

/// Single-part multipart body.
pub fn multipart_body(field: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n", field, filename).as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY)
}

/// Minimal bytes that pass PNG sniffing.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";
