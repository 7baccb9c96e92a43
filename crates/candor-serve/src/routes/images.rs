//! `/api/images`: cached gallery listing.

use axum::Json;
use axum::extract::{RawQuery, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use candor_core::GalleryImage;
use serde::Serialize;

use crate::error::ApiError;
use crate::gallery::{cached_images, parse_limit};
use crate::routes::cors::is_trusted;
use crate::state::AppState;

/// Cache lifetime of the "not configured" answer.
const UNCONFIGURED_MAX_AGE_SECS: u64 = 300;

#[derive(Debug, Serialize)]
pub struct ImagesResponse {
    success: bool,
    images: Vec<GalleryImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

fn cache_control(max_age_secs: u64) -> [(axum::http::HeaderName, String); 1] {
    [(CACHE_CONTROL, format!("public, max-age={max_age_secs}"))]
}

/// First `limit` value in a raw query string. Repeated or malformed pairs
/// never fail the request.
fn limit_param(query: Option<&str>) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "limit")
        .map(|(_, value)| value.into_owned())
}

/// Any method is routed here so that the origin check comes before the
/// method check. The query is read raw so that nothing is rejected before
/// those checks run.
pub async fn list(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    if !is_trusted(&headers, state.config.environment) {
        tracing::warn!("image request from untrusted origin");
        return Err(ApiError::Forbidden("Request not authorized"));
    }

    if method != Method::GET {
        return Err(ApiError::MethodNotAllowed);
    }

    let Some(credential) = state.config.instagram_access_token.as_deref() else {
        tracing::debug!("INSTAGRAM_ACCESS_TOKEN not set; returning empty gallery");
        let body = ImagesResponse {
            success: true,
            images: Vec::new(),
            count: None,
            message: Some("Instagram not configured"),
        };
        return Ok((cache_control(UNCONFIGURED_MAX_AGE_SECS), Json(body)).into_response());
    };

    let limit = parse_limit(limit_param(query.as_deref()).as_deref());
    let ttl = state.config.image_cache_ttl;
    let images = cached_images(&state.cache, state.gallery.as_ref(), credential, limit, ttl).await;

    let body = ImagesResponse {
        success: true,
        count: Some(images.len()),
        images,
        message: None,
    };
    Ok((cache_control(ttl.as_secs()), Json(body)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_limit_wins() {
        assert_eq!(limit_param(Some("limit=1&limit=2")).as_deref(), Some("1"));
        assert_eq!(limit_param(Some("foo=bar&limit=%2012")).as_deref(), Some(" 12"));
        assert_eq!(limit_param(Some("foo=bar")), None);
        assert_eq!(limit_param(Some("limit")).as_deref(), Some(""));
        assert_eq!(limit_param(None), None);
    }
}
