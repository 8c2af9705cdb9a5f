#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use music_review_api::config::AppConfig;
use music_review_api::database::MemoryStore;
use music_review_api::services::SignupRequest;
use music_review_api::types::Role;
use music_review_api::{app, AppState};

pub const PASSWORD: &str = "password123";

/// In-process server over a fresh in-memory store
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

/// A signed-in account
pub struct Session {
    pub id: String,
    pub token: String,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.token_secret = "integration-test-secret".to_string();
    config.security.password_hash_memory_kib = 8;
    config.security.password_hash_iterations = 1;
    config.api.enable_request_logging = false;
    config
}

impl TestApp {
    pub fn new() -> Result<Self> {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Result<Self> {
        let state = AppState::new(config, Arc::new(MemoryStore::new())).context("failed to build state")?;
        let router = app(state.clone());
        Ok(Self { state, router })
    }

    /// Sends one request through the full router and returns status and parsed body.
    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response body is not JSON")?
        };
        Ok((status, body))
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.call(Method::DELETE, uri, token, None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let (status, body) = self
            .post("/auth/login", None, json!({ "email": email, "password": password }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);

        Ok(Session {
            id: body["data"]["user"]["id"].as_str().context("missing user id")?.to_string(),
            token: body["data"]["token"].as_str().context("missing token")?.to_string(),
        })
    }

    /// Signs up through the API and logs in. Email is `<username>@example.com`.
    pub async fn user(&self, username: &str) -> Result<Session> {
        let email = format!("{}@example.com", username);
        let (status, body) = self
            .post(
                "/auth/signup",
                None,
                json!({ "username": username, "email": email, "password": PASSWORD }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "signup failed: {} {}", status, body);
        self.login(&email, PASSWORD).await
    }

    /// Admins can only be bootstrapped outside the HTTP API.
    pub async fn admin(&self, username: &str) -> Result<Session> {
        let email = format!("{}@example.com", username);
        self.state
            .accounts()
            .register(
                SignupRequest {
                    username: Some(username.to_string()),
                    email: Some(email.clone()),
                    password: Some(PASSWORD.to_string()),
                    avatar: None,
                },
                Role::Admin,
            )
            .await
            .map_err(|e| anyhow::anyhow!("admin bootstrap failed: {}", e))?;
        self.login(&email, PASSWORD).await
    }

    pub async fn artist(&self, admin: &Session, name: &str) -> Result<String> {
        let (status, body) = self
            .post("/artists", Some(&admin.token), json!({ "name": name, "genre": "Rock" }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "artist create failed: {} {}", status, body);
        Ok(body["data"]["id"].as_str().context("missing artist id")?.to_string())
    }

    pub async fn album(&self, admin: &Session, artist_id: &str, title: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/albums",
                Some(&admin.token),
                json!({ "title": title, "artist": artist_id, "year": 1997, "genre": "Rock" }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "album create failed: {} {}", status, body);
        Ok(body["data"]["id"].as_str().context("missing album id")?.to_string())
    }
}

/// The machine-readable error code of an error body
pub fn code(body: &Value) -> &str {
    body["code"].as_str().unwrap_or_default()
}
