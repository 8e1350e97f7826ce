use crate::server::AppContext;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(get_tools))
}

async fn health(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "transcoder_available": ctx.tools.require(camview_av::TRANSCODER).is_ok(),
        "probe_timeout_ms": ctx.config.probe.timeout_ms,
    }))
}

#[derive(Serialize)]
struct ToolStatusResponse {
    name: String,
    available: bool,
    version: Option<String>,
    path: Option<String>,
}

async fn get_tools(State(ctx): State<AppContext>) -> impl IntoResponse {
    // `-version` runs a subprocess per tool.
    let tools = ctx.tools.clone();
    match tokio::task::spawn_blocking(move || tools.check_all()).await {
        Ok(tools) => {
            let response: Vec<ToolStatusResponse> = tools
                .into_iter()
                .map(|t| ToolStatusResponse {
                    name: t.name,
                    available: t.available,
                    version: t.version,
                    path: t.path.map(|p| p.display().to_string()),
                })
                .collect();
            Json(response).into_response()
        }
        Err(e) => {
            tracing::error!("Tool check task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
