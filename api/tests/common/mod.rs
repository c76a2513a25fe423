#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use tsundoku_api::{router, ApiState, AuthGateway, Claims, DEFAULT_AUTH_COOKIE};
use tsundoku_core::models::{NewContent, TargetKind};
use tsundoku_core::Database;

pub const SECRET: &str = "integration-secret";

pub struct TestApp {
    _dir: TempDir,
    pub app: Router,
    pub state: Arc<ApiState>,
}

pub fn setup() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("test.db"));
    db.create().unwrap();

    let state = Arc::new(ApiState::new(
        db,
        AuthGateway::new(SECRET, DEFAULT_AUTH_COOKIE),
        Duration::from_secs(5),
    ));
    TestApp {
        _dir: dir,
        app: router(state.clone()),
        state,
    }
}

pub fn token(id: i64, username: &str, admin: bool) -> String {
    let claims = Claims {
        sub: id.to_string(),
        username: username.to_string(),
        admin,
        exp: (chrono::Utc::now().timestamp() + 3600) as u64,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

impl TestApp {
    pub fn comic(&self, title: &str) -> i64 {
        self.state
            .catalog
            .create_content(TargetKind::Comic, &NewContent::new(title, "Author", "manga"))
            .unwrap()
            .id
    }

    pub fn novel(&self, title: &str) -> i64 {
        self.state
            .catalog
            .create_content(TargetKind::Novel, &NewContent::new(title, "Author", "light novel"))
            .unwrap()
            .id
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }
}

/// `(id, rank)` pairs from a favorites listing
pub fn ranks(list: &Value) -> Vec<(i64, i64)> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|f| (f["id"].as_i64().unwrap(), f["rank"].as_i64().unwrap()))
        .collect()
}
