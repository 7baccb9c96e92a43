//! Email provider clients (Brevo, Resend).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::envelope::{EmailEnvelope, Mailbox};

const BREVO_URL: &str = "https://api.brevo.com/v3/smtp/email";
const RESEND_URL: &str = "https://api.resend.com/emails";

/// Upstream delivery failure. Never surfaced to the visitor.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected message with {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Sends one envelope; returns the provider's message id.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, envelope: &EmailEnvelope) -> Result<String, DeliveryError>;
}

/// POST a JSON body and decode the JSON reply, mapping non-2xx to
/// [`DeliveryError::Rejected`].
async fn post_json<R: for<'de> Deserialize<'de>>(
    request: reqwest::RequestBuilder,
    body: &Value,
) -> Result<R, DeliveryError> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json")
        .json(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}

// =============================================================================
// Brevo
// =============================================================================

#[derive(Clone)]
pub struct BrevoProvider {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct BrevoReply {
    #[serde(rename = "messageId", default)]
    message_id: String,
}

impl BrevoProvider {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

fn brevo_mailbox(mailbox: &Mailbox) -> Value {
    match &mailbox.name {
        Some(name) => json!({ "email": mailbox.email, "name": name }),
        None => json!({ "email": mailbox.email }),
    }
}

/// Brevo transactional email body.
fn brevo_body(envelope: &EmailEnvelope) -> Value {
    json!({
        "subject": envelope.subject,
        "htmlContent": envelope.html_body,
        "textContent": envelope.text_body,
        "sender": brevo_mailbox(&envelope.sender),
        "to": envelope.recipients.iter().map(brevo_mailbox).collect::<Vec<_>>(),
        "replyTo": brevo_mailbox(&envelope.reply_to),
        "headers": envelope.headers,
        "tags": envelope.tags.iter().map(|(_, v)| v).collect::<Vec<_>>(),
    })
}

#[async_trait]
impl EmailProvider for BrevoProvider {
    fn name(&self) -> &'static str {
        "brevo"
    }

    async fn send(&self, envelope: &EmailEnvelope) -> Result<String, DeliveryError> {
        let request = self.client.post(BREVO_URL).header("api-key", &self.api_key);
        let reply: BrevoReply = post_json(request, &brevo_body(envelope)).await?;
        Ok(reply.message_id)
    }
}

// =============================================================================
// Resend
// =============================================================================

#[derive(Clone)]
pub struct ResendProvider {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ResendReply {
    #[serde(default)]
    id: String,
}

impl ResendProvider {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

/// Resend email body.
fn resend_body(envelope: &EmailEnvelope) -> Value {
    json!({
        "from": envelope.sender.formatted(),
        "to": envelope.recipients.iter().map(|m| m.email.as_str()).collect::<Vec<_>>(),
        "subject": envelope.subject,
        "html": envelope.html_body,
        "text": envelope.text_body,
        "reply_to": envelope.reply_to.formatted(),
        "headers": envelope.headers,
        "tags": envelope
            .tags
            .iter()
            .map(|(name, value)| json!({ "name": name, "value": value }))
            .collect::<Vec<_>>(),
    })
}

#[async_trait]
impl EmailProvider for ResendProvider {
    fn name(&self) -> &'static str {
        "resend"
    }

    async fn send(&self, envelope: &EmailEnvelope) -> Result<String, DeliveryError> {
        let request = self.client.post(RESEND_URL).bearer_auth(&self.api_key);
        let reply: ResendReply = post_json(request, &resend_body(envelope)).await?;
        Ok(reply.id)
    }
}
