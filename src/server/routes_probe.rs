//! Reachability probe endpoint.

use crate::server::AppContext;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use camview_probe::ProbeResult;

const INVALID_JSON: &str = "Request body must be valid JSON.";
const MISSING_URL: &str = "Field 'url' is required and must be a string.";
const INVALID_URL: &str = "Invalid URL. Expected a URL like protocol://host[:port]/path.";

pub fn probe_routes() -> Router<AppContext> {
    Router::new().route("/rtsp/test", post(test_stream))
}

/// The body is taken as raw bytes so that malformed JSON, a missing field and
/// a non-string field each get their own 400 message instead of axum's
/// generic rejection.
async fn test_stream(State(ctx): State<AppContext>, body: Bytes) -> Response {
    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => return bad_request(INVALID_JSON),
    };

    let raw = match value.get("url").and_then(|u| u.as_str()) {
        Some(url) if !url.is_empty() => url,
        _ => return bad_request(MISSING_URL),
    };

    let endpoint = match camview_common::resolve(raw) {
        Ok(ep) => ep,
        Err(e) => {
            // The raw string may carry credentials; log only the parse error.
            tracing::debug!(error = %e, "Rejected probe URL");
            return bad_request(INVALID_URL);
        }
    };

    let result = ctx.prober.probe(&endpoint).await;
    tracing::info!(
        endpoint = %endpoint,
        prober = ctx.prober.name(),
        ok = result.ok,
        round_trip_ms = ?result.round_trip_ms,
        "Probe finished"
    );

    let status = if result.ok {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(result)).into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ProbeResult::failed(message))).into_response()
}
