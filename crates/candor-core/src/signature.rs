//! HMAC-SHA256 request signing and verification.
//!
//! The signed message is the compact JSON object
//!
//! ```text
//! {"name":…,"email":…,"service":…,"message":…,"timestamp":…,"nonce":…}
//! ```
//!
//! with keys in exactly that order, which is byte-identical to what the
//! browser produces with `JSON.stringify`. The MAC is lowercase hex.

use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::Serialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};
use crate::submission::{ContactSubmission, SignedSubmission};

type HmacSha256 = Hmac<Sha256>;

/// Number of random bytes in a nonce (hex-encoded to twice as many chars).
pub const NONCE_BYTES: usize = 16;

#[derive(Serialize)]
struct CanonicalMessage<'a> {
    name: &'a str,
    email: &'a str,
    service: &'a str,
    message: &'a str,
    timestamp: i64,
    nonce: &'a str,
}

/// Serialize the signed fields in their stable order.
pub fn canonical_message(
    submission: &ContactSubmission,
    timestamp: i64,
    nonce: &str,
) -> Result<String> {
    let message = CanonicalMessage {
        name: &submission.name,
        email: &submission.email,
        service: &submission.service,
        message: &submission.message,
        timestamp,
        nonce,
    };
    Ok(serde_json::to_string(&message)?)
}

/// Compute the hex MAC for a submission.
pub fn sign(
    submission: &ContactSubmission,
    timestamp: i64,
    nonce: &str,
    secret: &str,
) -> Result<String> {
    if secret.is_empty() {
        return Err(Error::MissingSecret);
    }
    let message = canonical_message(submission, timestamp, nonce)?;
    // HMAC accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| Error::MissingSecret)?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Recompute the MAC of a signed submission and compare it in constant time.
pub fn verify(signed: &SignedSubmission, secret: &str) -> Result<()> {
    let expected = sign(&signed.contact, signed.timestamp, &signed.nonce, secret)?;
    if bool::from(expected.as_bytes().ct_eq(signed.hmac.as_bytes())) {
        Ok(())
    } else {
        Err(Error::SignatureMismatch)
    }
}

/// A fresh random nonce, hex-encoded.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Sign a submission the way the browser does at submit time.
pub fn seal(contact: ContactSubmission, timestamp: i64, secret: &str) -> Result<SignedSubmission> {
    let nonce = generate_nonce();
    let hmac = sign(&contact, timestamp, &nonce, secret)?;
    Ok(SignedSubmission {
        contact,
        timestamp,
        nonce,
        hmac,
    })
}
