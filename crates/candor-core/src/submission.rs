//! Contact form submission types and field validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Basic `local@domain.tld` shape.
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex should compile"));

/// The four fields a visitor fills in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    /// Service the visitor is interested in.
    pub service: String,
    pub message: String,
}

impl ContactSubmission {
    /// Check that every field is non-empty after trimming and that the email
    /// looks like an address. Returns a trimmed copy.
    pub fn validated(&self) -> Result<Self> {
        let name = non_blank("name", &self.name)?;
        let email = non_blank("email", &self.email)?;
        let service = non_blank("service", &self.service)?;
        let message = non_blank("message", &self.message)?;

        if !is_valid_email(email) {
            return Err(Error::InvalidField {
                field: "email",
                reason: "not a valid email address".to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            service: service.to_string(),
            message: message.to_string(),
        })
    }
}

/// A submission plus the signing material produced in the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedSubmission {
    #[serde(flatten)]
    pub contact: ContactSubmission,
    /// Unix milliseconds at submit time.
    pub timestamp: i64,
    /// 16 random bytes, hex.
    pub nonce: String,
    /// HMAC-SHA256, hex.
    pub hmac: String,
}

/// Wire shape of `POST /api/contact`; every field optional so that a missing
/// field can be reported as such rather than as a JSON error.
#[derive(Debug, Default, Deserialize)]
struct SubmissionPayload {
    name: Option<String>,
    email: Option<String>,
    service: Option<String>,
    message: Option<String>,
    timestamp: Option<i64>,
    nonce: Option<String>,
    hmac: Option<String>,
}

impl SignedSubmission {
    /// Parse a request body. Any field that is absent, blank, or (for the
    /// timestamp) zero is reported as [`Error::MissingField`].
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let payload: SubmissionPayload = serde_json::from_slice(body)?;

        let name = required("name", payload.name)?;
        let email = required("email", payload.email)?;
        let service = required("service", payload.service)?;
        let message = required("message", payload.message)?;
        let timestamp = payload
            .timestamp
            .filter(|ts| *ts != 0)
            .ok_or(Error::MissingField("timestamp"))?;
        let nonce = required("nonce", payload.nonce)?;
        let hmac = required("hmac", payload.hmac)?;

        Ok(Self {
            contact: ContactSubmission {
                name,
                email,
                service,
                message,
            },
            timestamp,
            nonce,
            hmac,
        })
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

fn required(field: &'static str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::MissingField(field)),
    }
}

fn non_blank<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::MissingField(field))
    } else {
        Ok(trimmed)
    }
}
