//! Integration tests for health, tool status, CORS and static hosting.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use camview::config::Config;
use camview_av::ToolRegistry;
use common::TestHarness;
use http_body_util::BodyExt;
use tower::ServiceExt;

#[tokio::test]
async fn health_check_returns_200() {
    let (_h, addr) = TestHarness::new().serve().await;
    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn api_health_reports_transcoder_missing() {
    let (_h, addr) = TestHarness::new().serve().await;
    let resp = reqwest::get(format!("http://{addr}/api/health"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["transcoder_available"], false);
    assert_eq!(json["probe_timeout_ms"], 5000);
}

#[tokio::test]
async fn tools_lists_ffmpeg_as_unavailable() {
    let (_h, addr) = TestHarness::new().serve().await;
    let resp = reqwest::get(format!("http://{addr}/api/tools"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let json: serde_json::Value = resp.json().await.unwrap();
    let tools = json.as_array().unwrap();
    let ffmpeg = tools.iter().find(|t| t["name"] == "ffmpeg").unwrap();
    assert_eq!(ffmpeg["available"], false);
    assert!(ffmpeg["path"].is_null());
}

#[cfg(unix)]
#[tokio::test]
async fn tools_reports_registered_transcoder_version() {
    let dir = tempfile::tempdir().unwrap();
    let script = common::fake_transcoder(dir.path(), "echo 'ffmpeg version 6.1-test'");
    let h = TestHarness::with_transcoder(&script);

    let req = Request::get("/api/tools").body(Body::empty()).unwrap();
    let resp = h.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let ffmpeg = json
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == "ffmpeg")
        .unwrap();
    assert_eq!(ffmpeg["available"], true);
    assert_eq!(ffmpeg["version"], "ffmpeg version 6.1-test");
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let h = TestHarness::new();
    let req = Request::get("/health")
        .header("origin", "http://viewer.local")
        .body(Body::empty())
        .unwrap();
    let resp = h.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn unknown_route_is_404_without_static_dir() {
    let h = TestHarness::new();
    let req = Request::get("/viewer").body(Body::empty()).unwrap();
    let resp = h.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_dir_serves_spa_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>camview</html>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();

    let mut config = Config::default();
    config.server.static_dir = Some(dir.path().to_path_buf());
    let h = TestHarness::with_tools(config, ToolRegistry::default());

    let req = Request::get("/app.js").body(Body::empty()).unwrap();
    let resp = h.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"console.log(1)");

    let req = Request::get("/some/client/route")
        .body(Body::empty())
        .unwrap();
    let resp = h.router().oneshot(req).await.unwrap();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<html>camview</html>");
}
