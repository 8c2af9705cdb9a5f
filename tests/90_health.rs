mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app.get("/health", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["store"], "memory");
    assert_eq!(body["data"]["environment"], "development");
    Ok(())
}

#[tokio::test]
async fn root_describes_the_service() -> Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app.get("/", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "music-review-api");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["data"]["endpoints"].is_object());
    Ok(())
}

#[tokio::test]
async fn cors_preflight_is_answered() -> Result<()> {
    let app = TestApp::new()?;

    let request = axum::http::Request::builder()
        .method("OPTIONS")
        .uri("/artists")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .body(axum::body::Body::empty())?;
    let (status, _) = app.send(request).await?;
    assert!(status.is_success(), "unexpected status {}", status);
    Ok(())
}
