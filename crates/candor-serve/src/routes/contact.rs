//! `POST /api/contact`: verify a signed submission and relay it by email.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use candor_core::metrics::{self as m, CONTACT_SUBMISSIONS, record_rejection};
use candor_core::{SignedSubmission, signature};
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::cors::is_trusted;
use crate::state::AppState;

pub const SUCCESS_MESSAGE: &str = "Thank you for your message! We'll get back to you soon.";

#[derive(Debug, Clone, Serialize)]
pub struct ContactResponse {
    success: bool,
    message: &'static str,
}

/// Log and count a rejected submission.
fn reject(reason: &'static str, detail: impl std::fmt::Display, error: ApiError) -> ApiError {
    record_rejection(reason);
    tracing::warn!(reason, detail = %detail, "contact submission rejected");
    error
}

/// Checks run in order and the first failure answers the request. Once the
/// submission is accepted the visitor gets 200 whatever happens to delivery.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ContactResponse>, ApiError> {
    if !is_trusted(&headers, state.config.environment) {
        return Err(reject(
            "origin",
            "untrusted origin",
            ApiError::Forbidden("Request not authorized"),
        ));
    }

    let Some(secret) = state.config.contact_form_secret.as_deref() else {
        record_rejection("configuration");
        return Err(ApiError::Configuration("CONTACT_FORM_SECRET is not set"));
    };

    let signed = SignedSubmission::from_json(&body).map_err(|e| {
        reject("fields", e, ApiError::BadRequest("All fields are required"))
    })?;

    state.replay.check_now(signed.timestamp).map_err(|e| {
        reject(
            "expired",
            e,
            ApiError::BadRequest("Request expired. Please try again."),
        )
    })?;

    signature::verify(&signed, secret).map_err(|e| {
        reject(
            "signature",
            e,
            ApiError::Forbidden("Invalid request signature"),
        )
    })?;

    let contact = signed.contact.validated().map_err(|e| match e {
        candor_core::Error::InvalidField { field: "email", .. } => reject(
            "email",
            e,
            ApiError::BadRequest("Please enter a valid email address"),
        ),
        _ => reject(
            "fields",
            e,
            ApiError::BadRequest("All fields are required and cannot be empty"),
        ),
    })?;

    m::increment(CONTACT_SUBMISSIONS);
    let outcome = state.mailer.deliver(&contact).await;
    tracing::info!(service = %contact.service, outcome = ?outcome, "contact submission accepted");

    Ok(Json(ContactResponse {
        success: true,
        message: SUCCESS_MESSAGE,
    }))
}
