use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures_util::TryStreamExt;

/// Forwards the upstream body chunk by chunk, in arrival order, without re-framing.
///
/// The returned body owns the upstream response: when the caller disconnects axum
/// drops the body, which drops the reqwest stream and closes the upstream connection.
pub fn stream_passthrough(upstream: reqwest::Response, model: String) -> Response {
    let byte_stream = upstream.bytes_stream().inspect_err(move |e| {
        tracing::error!(model = %model, error = %e, "Upstream stream aborted");
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .header("x-accel-buffering", "no")
        .body(Body::from_stream(byte_stream))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
