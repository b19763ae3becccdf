//! Request logging and panic recovery.

use crate::error::AppError;
use crate::server::error::ApiErr;
use axum::body::Body;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::any::Any;
use std::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Log method, path, status and latency of every request.
///
/// Reuses an incoming `x-request-id` or generates one, and echoes it on the
/// response.
pub async fn log_requests(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let mut response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();
    if status.is_server_error() {
        log::error!("[{}] {} {} -> {} ({} ms)", request_id, method, path, status, elapsed_ms);
    } else if status.is_client_error() {
        log::warn!("[{}] {} {} -> {} ({} ms)", request_id, method, path, status, elapsed_ms);
    } else {
        log::info!("[{}] {} {} -> {} ({} ms)", request_id, method, path, status, elapsed_ms);
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Turn a handler panic into a regular `INTERNAL_ERROR` response.
///
/// Used with `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    log::error!("Handler panicked: {}", detail);
    ApiErr(AppError::internal(detail)).into_response()
}
