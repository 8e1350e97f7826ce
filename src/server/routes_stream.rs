//! Live MP4 stream endpoint.
//!
//! Each request spawns its own transcoder. The response body is the
//! transcoder's stdout; dropping the body (client disconnect) kills the
//! process.

use crate::server::error::AppError;
use crate::server::AppContext;
use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use camview_av::profile::OUTPUT_CONTENT_TYPE;
use camview_common::Error;

pub fn stream_routes() -> Router<AppContext> {
    Router::new().route("/stream", get(stream))
}

/// First `url` value in the query string; later repeats are ignored.
fn first_url(params: Vec<(String, String)>) -> Option<String> {
    params
        .into_iter()
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value)
        .filter(|url| !url.is_empty())
}

async fn stream(
    State(ctx): State<AppContext>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let raw =
        first_url(params).ok_or_else(|| Error::validation("Missing 'url' query parameter"))?;

    let endpoint = camview_common::resolve(&raw)
        .map_err(|_| Error::validation("Invalid URL. Expected protocol://host[:port]/path"))?;

    tracing::info!(endpoint = %endpoint, "Starting MP4 stream");

    let session = ctx.supervisor.start(&endpoint)?;
    let body = Body::from_stream(session.into_relay());

    Ok((
        [
            (header::CONTENT_TYPE, OUTPUT_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response())
}
