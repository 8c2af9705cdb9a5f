mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, Utc};
use common::{code, TestApp, PASSWORD};
use music_review_api::types::Role;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn signup_creates_a_plain_user() -> Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app
        .post(
            "/auth/signup",
            None,
            json!({ "username": "thom", "email": "Thom@Example.com", "password": PASSWORD, "role": "admin" }),
        )
        .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["username"], "thom");
    assert_eq!(body["data"]["role"], "user");
    assert!(body["data"].get("password_hash").is_none());
    assert!(body["data"].get("password").is_none());

    // Stored email is normalized
    app.login("thom@example.com", PASSWORD).await?;
    Ok(())
}

#[tokio::test]
async fn signup_rejects_duplicates_and_missing_fields() -> Result<()> {
    let app = TestApp::new()?;
    app.user("thom").await?;

    let (status, body) = app
        .post(
            "/auth/signup",
            None,
            json!({ "username": "other", "email": "THOM@example.com", "password": PASSWORD }),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), "EMAIL_EXISTS");

    let (status, body) = app
        .post(
            "/auth/signup",
            None,
            json!({ "username": "thom", "email": "fresh@example.com", "password": PASSWORD }),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(code(&body), "USERNAME_EXISTS");

    let (status, body) = app
        .post("/auth/signup", None, json!({ "username": "jonny", "password": PASSWORD }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code(&body), "MISSING_FIELD");
    assert_eq!(body["field"], "email");

    let (status, body) = app
        .post(
            "/auth/signup",
            None,
            json!({ "username": "jo", "email": "jo@example.com", "password": PASSWORD }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(code(&body), "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn malformed_json_gets_the_error_envelope() -> Result<()> {
    let app = TestApp::new()?;

    let request = Request::builder()
        .method("POST")
        .uri("/auth/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"username\": "))?;
    let (status, body) = app.send(request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(code(&body), "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn login_failures_are_indistinguishable() -> Result<()> {
    let app = TestApp::new()?;
    app.user("thom").await?;

    let (wrong_status, wrong_body) = app
        .post("/auth/login", None, json!({ "email": "thom@example.com", "password": "nope" }))
        .await?;
    let (unknown_status, unknown_body) = app
        .post("/auth/login", None, json!({ "email": "ghost@example.com", "password": "nope" }))
        .await?;

    assert_eq!(wrong_status, StatusCode::FORBIDDEN);
    assert_eq!(unknown_status, StatusCode::FORBIDDEN);
    assert_eq!(code(&wrong_body), "INVALID_CREDENTIALS");
    assert_eq!(wrong_body, unknown_body);
    Ok(())
}

#[tokio::test]
async fn verify_returns_the_current_user() -> Result<()> {
    let app = TestApp::new()?;
    let session = app.user("thom").await?;

    let (status, body) = app.get("/auth/verify", Some(&session.token)).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], session.id.as_str());
    assert_eq!(body["data"]["email"], "thom@example.com");
    assert_eq!(body["data"]["favorite_albums"], json!([]));
    assert!(body["data"].get("password_hash").is_none());
    Ok(())
}

#[tokio::test]
async fn authentication_gate_rejections() -> Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app.get("/auth/verify", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code(&body), "MISSING_CREDENTIAL");

    for value in ["Token abc", "Bearer", "Bearer null", "Bearer undefined", "Bearer a b"] {
        let request = Request::builder()
            .uri("/auth/verify")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())?;
        let (status, body) = app.send(request).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {:?}", value);
        assert_eq!(code(&body), "MALFORMED_CREDENTIAL", "header {:?}", value);
    }

    let (status, body) = app.get("/auth/verify", Some("not.a.jwt")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code(&body), "INVALID_TOKEN");
    Ok(())
}

#[tokio::test]
async fn expired_tokens_are_rejected() -> Result<()> {
    let app = TestApp::new()?;
    let session = app.user("thom").await?;

    let user_id: Uuid = session.id.parse()?;
    let stale = app
        .state
        .tokens
        .issue_at(user_id, Role::User, Utc::now() - Duration::hours(7))?;

    let (status, body) = app.get("/auth/verify", Some(&stale)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code(&body), "INVALID_TOKEN");
    Ok(())
}

#[tokio::test]
async fn tokens_from_another_secret_are_rejected() -> Result<()> {
    let app = TestApp::new()?;
    let session = app.user("thom").await?;

    let mut config = common::test_config();
    config.security.token_secret = "some-other-secret".to_string();
    let other = TestApp::with_config(config)?;

    let (status, body) = other.get("/auth/verify", Some(&session.token)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(code(&body), "INVALID_TOKEN");
    Ok(())
}
