//! Origin-gated CORS for `/api/*`.
//!
//! Preflights are answered here. For every other request the validated
//! origin is echoed back; an unvalidated origin is never echoed.

use axum::extract::{Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE, CONTENT_TYPE, ORIGIN, REFERER, VARY,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use candor_core::{Environment, is_valid_origin};

use crate::state::AppState;

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const MAX_AGE_SECS: &str = "86400";
const PREFLIGHT_REJECTED: &str = "CORS request not allowed";

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Whether the request's Origin, or failing that its Referer, is trusted.
pub fn is_trusted(headers: &HeaderMap, env: Environment) -> bool {
    is_valid_origin(header_str(headers, ORIGIN), header_str(headers, REFERER), env)
}

/// The request's `Origin` header if it is on the allow-list.
fn allowed_origin(headers: &HeaderMap, env: Environment) -> Option<HeaderValue> {
    let origin = header_str(headers, ORIGIN)?;
    if env.allowed_origins().contains(&origin) {
        HeaderValue::from_str(origin).ok()
    } else {
        None
    }
}

fn add_origin(headers: &mut HeaderMap, origin: HeaderValue) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.append(VARY, HeaderValue::from_static("Origin"));
}

/// Middleware for the API router.
pub async fn api_cors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let env = state.config.environment;
    let origin = allowed_origin(request.headers(), env);

    if request.method() == Method::OPTIONS {
        return preflight(request.headers(), origin, env);
    }

    let mut response = next.run(request).await;
    if let Some(origin) = origin {
        add_origin(response.headers_mut(), origin);
    }
    response
}

fn preflight(headers: &HeaderMap, origin: Option<HeaderValue>, env: Environment) -> Response {
    if !is_trusted(headers, env) {
        tracing::warn!(
            origin = header_str(headers, ORIGIN).unwrap_or(""),
            "preflight from untrusted origin"
        );
        return (
            StatusCode::FORBIDDEN,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            PREFLIGHT_REJECTED,
        )
            .into_response();
    }

    let mut response = StatusCode::OK.into_response();
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECS));
    if let Some(origin) = origin {
        add_origin(headers, origin);
    }
    response
}
