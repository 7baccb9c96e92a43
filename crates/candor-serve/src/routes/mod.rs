//! API route definitions.

mod contact;
mod cors;
mod health;
mod images;

use std::any::Any;

use axum::Router;
use axum::http::HeaderValue;
use axum::http::header::{
    CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
    X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::{SetResponseHeader, SetResponseHeaderLayer};

use crate::error::ApiError;
use crate::state::AppState;

/// Policy for pages served from `STATIC_DIR`.
const CONTENT_SECURITY: &str = "default-src 'self'; \
    script-src 'self' 'unsafe-inline' 'unsafe-eval'; \
    style-src 'self' 'unsafe-inline'; \
    img-src 'self' data: https:; \
    font-src 'self' data:; \
    connect-src 'self' https:;";

/// Cache policy for the SPA entry document.
const HTML_CACHE_CONTROL: &str = "public, max-age=300, s-maxage=300";

/// Build the complete router.
///
/// # Route Structure
///
/// - `GET /health` - Health check (no origin check)
/// - `OPTIONS /api/*` - CORS preflight
/// - `POST /api/contact` - Signed contact form submission
/// - `/api/images` - Gallery listing (`GET` only, other methods get 405)
/// - `/api/*` - Anything else is a JSON 404
///
/// With `STATIC_DIR` set, other paths are served from that directory and
/// unknown ones fall back to its `index.html`. Those responses also carry a
/// content security policy, and the fallback document a short cache lifetime.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/contact", post(contact::submit).fallback(not_found))
        .route("/images", any(images::list))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), cors::api_cors));

    let mut app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api);

    if let Some(dir) = &state.config.static_dir {
        let index = SetResponseHeader::overriding(
            ServeFile::new(dir.join("index.html")),
            CACHE_CONTROL,
            HeaderValue::from_static(HTML_CACHE_CONTROL),
        );
        let files = SetResponseHeader::overriding(
            ServeDir::new(dir).fallback(index),
            CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY),
        );
        let files = SetResponseHeader::overriding(
            files,
            X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        );
        app = app.fallback_service(files);
    }

    app.layer(CatchPanicLayer::custom(handle_panic))
        .layer(SetResponseHeaderLayer::overriding(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Turn a handler panic into the generic 500 body.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, VARY};
    use axum::http::{Request, StatusCode};
    use candor_core::{ContactSubmission, GalleryImage, now_millis, signature};
    use tower::ServiceExt;

    use super::contact::SUCCESS_MESSAGE;
    use crate::cache::MemoryStore;
    use crate::config::Config;
    use crate::error::GENERIC_ERROR;
    use crate::gallery::{GalleryError, GallerySource};
    use crate::relay::testing::RecordingProvider;
    use crate::relay::{Addresses, EmailProvider, EnvelopeKind, Mailer};

    const SECRET: &str = "test-secret";
    const ORIGIN: &str = "http://localhost:5173";

    struct StaticGallery;

    #[async_trait]
    impl GallerySource for StaticGallery {
        async fn fetch(
            &self,
            _credential: &str,
            limit: u32,
        ) -> Result<Vec<GalleryImage>, GalleryError> {
            Ok((0..limit)
                .map(|i| {
                    GalleryImage::new(
                        Some(i.to_string()),
                        format!("https://cdn.example/{i}.jpg"),
                        Some("New cover #books".to_string()),
                    )
                })
                .collect())
        }
    }

    fn config() -> Config {
        Config {
            contact_form_secret: Some(SECRET.to_string()),
            from_email: Some("site@candorfiction.com".to_string()),
            to_email: Some("hello@candorfiction.com".to_string()),
            ..Config::default()
        }
    }

    fn app_with(config: Config, provider: Arc<RecordingProvider>) -> Router {
        let addresses = match (&config.from_email, &config.to_email) {
            (Some(from), Some(to)) => Some(Addresses {
                from: from.clone(),
                to: to.clone(),
            }),
            _ => None,
        };
        let provider: Arc<dyn EmailProvider> = provider;
        let mailer = Mailer::new(vec![provider], addresses, Duration::from_secs(5));
        let state = AppState::with_parts(
            config,
            Arc::new(MemoryStore::default()),
            Arc::new(StaticGallery),
            mailer,
        );
        router(state)
    }

    fn app() -> Router {
        app_with(config(), Arc::new(RecordingProvider::ok("brevo")))
    }

    fn contact() -> ContactSubmission {
        ContactSubmission {
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            service: "writing".to_string(),
            message: "Hi".to_string(),
        }
    }

    fn signed_body(contact: ContactSubmission, timestamp: i64) -> Vec<u8> {
        let signed = signature::seal(contact, timestamp, SECRET).unwrap();
        serde_json::to_vec(&signed).unwrap()
    }

    fn post_contact(body: Vec<u8>, origin: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/contact")
            .header(CONTENT_TYPE, "application/json");
        if let Some(origin) = origin {
            builder = builder.header("origin", origin);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn request(method: &str, uri: &str, origin: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(origin) = origin {
            builder = builder.header("origin", origin);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // =========================================================================
    // Contact
    // =========================================================================

    #[tokio::test]
    async fn contact_accepts_signed_submission() {
        let provider = Arc::new(RecordingProvider::ok("brevo"));
        let app = app_with(config(), provider.clone());

        let body = signed_body(contact(), now_millis());
        let response = app.oneshot(post_contact(body, Some(ORIGIN))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
        assert_eq!(response.headers()[VARY], "Origin");
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], SUCCESS_MESSAGE);

        let sent = provider.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].kind, EnvelopeKind::Business);
        assert_eq!(sent[0].recipients[0].email, "hello@candorfiction.com");
        assert_eq!(sent[1].kind, EnvelopeKind::Confirmation);
        assert_eq!(sent[1].recipients[0].email, "ana@x.com");
    }

    #[tokio::test]
    async fn contact_succeeds_when_delivery_fails() {
        let provider = Arc::new(RecordingProvider::failing(
            "brevo",
            vec![EnvelopeKind::Business, EnvelopeKind::Confirmation],
        ));
        let app = app_with(config(), provider.clone());

        let body = signed_body(contact(), now_millis());
        let response = app.oneshot(post_contact(body, Some(ORIGIN))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], true);
        assert_eq!(provider.sent().len(), 1);
    }

    #[tokio::test]
    async fn contact_accepts_trusted_referer() {
        let body = signed_body(contact(), now_millis());
        let request = Request::builder()
            .method("POST")
            .uri("/api/contact")
            .header("referer", "http://localhost:5173/contact")
            .body(Body::from(body))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn contact_rejects_untrusted_origin() {
        let provider = Arc::new(RecordingProvider::ok("brevo"));
        let app = app_with(config(), provider.clone());

        let body = signed_body(contact(), now_millis());
        let response = app
            .oneshot(post_contact(body, Some("https://evil.example")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Request not authorized");
        assert!(provider.sent().is_empty());
    }

    #[tokio::test]
    async fn contact_without_origin_is_forbidden() {
        let body = signed_body(contact(), now_millis());
        let response = app().oneshot(post_contact(body, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn contact_without_secret_is_server_error() {
        let config = Config {
            contact_form_secret: None,
            ..config()
        };
        let app = app_with(config, Arc::new(RecordingProvider::ok("brevo")));

        let body = signed_body(contact(), now_millis());
        let response = app.oneshot(post_contact(body, Some(ORIGIN))).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Server configuration error");
    }

    #[tokio::test]
    async fn contact_missing_or_blank_fields() {
        let missing = serde_json::json!({
            "name": "Ana", "email": "ana@x.com", "service": "writing",
            "timestamp": now_millis(), "nonce": "00", "hmac": "00"
        });
        let blank = serde_json::json!({
            "name": "Ana", "email": "ana@x.com", "service": "writing", "message": "   ",
            "timestamp": now_millis(), "nonce": "00", "hmac": "00"
        });

        for body in [
            serde_json::to_vec(&missing).unwrap(),
            serde_json::to_vec(&blank).unwrap(),
            b"{not json".to_vec(),
        ] {
            let response = app().oneshot(post_contact(body, Some(ORIGIN))).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await["error"], "All fields are required");
        }
    }

    #[tokio::test]
    async fn contact_rejects_expired_timestamp() {
        let eleven_minutes_ago = now_millis() - 11 * 60 * 1000;
        let body = signed_body(contact(), eleven_minutes_ago);
        let response = app().oneshot(post_contact(body, Some(ORIGIN))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Request expired. Please try again."
        );
    }

    #[tokio::test]
    async fn contact_rejects_tampered_message() {
        let mut signed = signature::seal(contact(), now_millis(), SECRET).unwrap();
        signed.contact.message.push('!');
        let body = serde_json::to_vec(&signed).unwrap();

        let response = app().oneshot(post_contact(body, Some(ORIGIN))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error"], "Invalid request signature");
    }

    #[tokio::test]
    async fn contact_rejects_wrong_secret() {
        let signed = signature::seal(contact(), now_millis(), "other-secret").unwrap();
        let body = serde_json::to_vec(&signed).unwrap();

        let response = app().oneshot(post_contact(body, Some(ORIGIN))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn contact_rejects_invalid_email() {
        let mut c = contact();
        c.email = "not-an-email".to_string();
        let body = signed_body(c, now_millis());

        let response = app().oneshot(post_contact(body, Some(ORIGIN))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Please enter a valid email address"
        );
    }

    #[tokio::test]
    async fn contact_get_is_not_found() {
        let response = app()
            .oneshot(request("GET", "/api/contact", Some(ORIGIN)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // =========================================================================
    // Images
    // =========================================================================

    #[tokio::test]
    async fn images_unconfigured() {
        let response = app()
            .oneshot(request("GET", "/api/images", Some(ORIGIN)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_CONTROL], "public, max-age=300");
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["images"], serde_json::json!([]));
        assert_eq!(json["message"], "Instagram not configured");
    }

    #[tokio::test]
    async fn images_listing() {
        let config = Config {
            instagram_access_token: Some("IGQVtoken".to_string()),
            ..config()
        };
        let app = app_with(config, Arc::new(RecordingProvider::ok("brevo")));

        let response = app
            .oneshot(request("GET", "/api/images?limit=3", Some(ORIGIN)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CACHE_CONTROL], "public, max-age=21600");
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
        let json = body_json(response).await;
        assert_eq!(json["count"], 3);
        assert_eq!(json["images"][0]["src"], "https://cdn.example/0.jpg");
        assert_eq!(json["images"][0]["alt"], "New cover");
        assert!(json.get("message").is_none());
    }

    #[tokio::test]
    async fn images_default_limit() {
        let config = Config {
            instagram_access_token: Some("IGQVtoken".to_string()),
            ..config()
        };
        let app = app_with(config, Arc::new(RecordingProvider::ok("brevo")));

        let response = app
            .oneshot(request("GET", "/api/images?limit=abc", Some(ORIGIN)))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["count"], 6);
    }

    #[tokio::test]
    async fn images_origin_checked_before_method() {
        let response = app()
            .oneshot(request("POST", "/api/images", Some("https://evil.example")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app()
            .oneshot(request("POST", "/api/images", Some(ORIGIN)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(response).await["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn images_repeated_limit_uses_first_value() {
        let config = Config {
            instagram_access_token: Some("IGQVtoken".to_string()),
            ..config()
        };
        let app = app_with(config, Arc::new(RecordingProvider::ok("brevo")));

        let response = app
            .clone()
            .oneshot(request(
                "GET",
                "/api/images?limit=1&limit=2",
                Some("https://evil.example"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Request not authorized");

        let response = app
            .oneshot(request("GET", "/api/images?limit=1&limit=2", Some(ORIGIN)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["count"], 1);
    }

    // =========================================================================
    // Preflight, fallbacks, headers
    // =========================================================================

    #[tokio::test]
    async fn preflight_allowed() {
        let response = app()
            .oneshot(request("OPTIONS", "/api/contact", Some(ORIGIN)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
        assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
        assert_eq!(
            headers["access-control-allow-headers"],
            "Content-Type, Authorization"
        );
        assert_eq!(headers["access-control-max-age"], "86400");
        assert_eq!(headers[VARY], "Origin");
    }

    #[tokio::test]
    async fn preflight_rejected() {
        let response = app()
            .oneshot(request("OPTIONS", "/api/images", Some("https://evil.example")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(body_text(response).await, "CORS request not allowed");
    }

    #[tokio::test]
    async fn unknown_api_path() {
        let response = app()
            .oneshot(request("GET", "/api/nope", Some(ORIGIN)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "API endpoint not found");
    }

    #[tokio::test]
    async fn unknown_api_path_does_not_echo_untrusted_origin() {
        let response = app()
            .oneshot(request("GET", "/api/nope", Some("https://evil.example")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn health_and_security_headers() {
        let response = app().oneshot(request("GET", "/health", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "candor-serve");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn static_dir_falls_back_to_index() {
        let dir = std::env::temp_dir().join(format!("candor-static-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<html>app</html>").unwrap();

        let config = Config {
            static_dir: Some(dir.clone()),
            ..config()
        };
        let app = app_with(config, Arc::new(RecordingProvider::ok("brevo")));

        let response = app
            .clone()
            .oneshot(request("GET", "/portfolio", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CACHE_CONTROL], HTML_CACHE_CONTROL);
        assert_eq!(headers["x-xss-protection"], "1; mode=block");
        assert!(
            headers[CONTENT_SECURITY_POLICY]
                .to_str()
                .unwrap()
                .starts_with("default-src 'self';")
        );
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(body_text(response).await, "<html>app</html>");

        // API misses stay JSON.
        let response = app
            .oneshot(request("GET", "/api/nope", Some(ORIGIN)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn panic_becomes_generic_error() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], GENERIC_ERROR);
    }
}
