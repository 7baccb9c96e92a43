//! Provider-neutral outbound email envelopes.

use std::collections::BTreeMap;

use candor_core::ContactSubmission;

use super::template::{self, COMPANY};

/// Which of the two per-submission emails an envelope is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    /// Notification to the business inbox.
    Business,
    /// Acknowledgement to the visitor.
    Confirmation,
}

impl EnvelopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::Confirmation => "confirmation",
        }
    }
}

/// An email address with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub email: String,
    pub name: Option<String>,
}

impl Mailbox {
    pub fn named(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: Some(name.into()),
        }
    }

    /// `Name <email>` or bare `email`.
    pub fn formatted(&self) -> String {
        match &self.name {
            Some(name) => format!("{name} <{}>", self.email),
            None => self.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailEnvelope {
    pub kind: EnvelopeKind,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub sender: Mailbox,
    pub recipients: Vec<Mailbox>,
    pub reply_to: Mailbox,
    pub headers: BTreeMap<String, String>,
    /// Name/value pairs for providers that support tagging.
    pub tags: Vec<(String, String)>,
}

/// Addresses used when building envelopes.
#[derive(Debug, Clone)]
pub struct Addresses {
    /// Sender address.
    pub from: String,
    /// Business inbox.
    pub to: String,
}

/// The business notification and the customer confirmation for one
/// submission, in sending order.
pub fn build_envelopes(
    contact: &ContactSubmission,
    addresses: &Addresses,
    submitted_at: &str,
) -> [EmailEnvelope; 2] {
    [
        business_envelope(contact, addresses, submitted_at),
        confirmation_envelope(contact, addresses),
    ]
}

pub fn business_envelope(
    contact: &ContactSubmission,
    addresses: &Addresses,
    submitted_at: &str,
) -> EmailEnvelope {
    let rendered = template::business_email(contact, submitted_at);
    EmailEnvelope {
        kind: EnvelopeKind::Business,
        subject: rendered.subject,
        html_body: rendered.html,
        text_body: rendered.text,
        sender: Mailbox::named(&addresses.from, format!("{COMPANY} Website")),
        recipients: vec![Mailbox::named(&addresses.to, COMPANY)],
        reply_to: Mailbox::named(&contact.email, &contact.name),
        headers: headers(&[("X-Contact-Form-Source", "website")]),
        tags: vec![
            ("type".to_string(), "contact-form".to_string()),
            ("service".to_string(), service_slug(&contact.service)),
            ("source".to_string(), "website".to_string()),
        ],
    }
}

pub fn confirmation_envelope(contact: &ContactSubmission, addresses: &Addresses) -> EmailEnvelope {
    let rendered = template::confirmation_email(contact);
    EmailEnvelope {
        kind: EnvelopeKind::Confirmation,
        subject: rendered.subject,
        html_body: rendered.html,
        text_body: rendered.text,
        sender: Mailbox::named(&addresses.from, COMPANY),
        recipients: vec![Mailbox::named(&contact.email, &contact.name)],
        reply_to: Mailbox::named(&addresses.to, format!("{COMPANY} Support")),
        headers: headers(&[
            ("X-Auto-Response-Suppress", "OOF, AutoReply"),
            ("X-Contact-Confirmation", "true"),
        ]),
        tags: vec![
            ("type".to_string(), "confirmation".to_string()),
            ("service".to_string(), service_slug(&contact.service)),
            ("auto-response".to_string(), "true".to_string()),
        ],
    }
}

fn headers(extra: &[(&str, &str)]) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::from([
        ("X-Mailer".to_string(), "Candor Fiction Contact Form".to_string()),
        ("X-Priority".to_string(), "3".to_string()),
    ]);
    for (k, v) in extra {
        headers.insert((*k).to_string(), (*v).to_string());
    }
    headers
}

/// Lowercase, whitespace runs collapsed to `-`.
pub fn service_slug(service: &str) -> String {
    service
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
