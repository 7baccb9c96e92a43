//! Outbound delivery of validated contact submissions.
//!
//! Each submission produces two emails: a notification to the business
//! inbox and a confirmation to the visitor. Providers are tried in order
//! (Brevo, then Resend). Within a provider the business email must succeed;
//! a failed confirmation is logged and does not undo the notification.
//! Delivery never affects the response the visitor gets.

pub mod envelope;
pub mod provider;
pub mod template;

use std::sync::Arc;
use std::time::Duration;

use candor_core::ContactSubmission;
use candor_core::metrics::record_delivery;

pub use self::envelope::{Addresses, EmailEnvelope, EnvelopeKind, Mailbox, build_envelopes};
pub use self::provider::{BrevoProvider, DeliveryError, EmailProvider, ResendProvider};

use crate::config::Config;

/// What happened to a submission's emails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The business notification went out through this provider.
    Sent { provider: &'static str },
    /// No provider or no addresses configured.
    NotConfigured,
    /// Every configured provider failed.
    Failed,
}

/// Sends submission emails through an ordered list of providers.
#[derive(Clone)]
pub struct Mailer {
    providers: Vec<Arc<dyn EmailProvider>>,
    addresses: Option<Addresses>,
    timeout: Duration,
}

impl Mailer {
    pub fn new(
        providers: Vec<Arc<dyn EmailProvider>>,
        addresses: Option<Addresses>,
        timeout: Duration,
    ) -> Self {
        Self {
            providers,
            addresses,
            timeout,
        }
    }

    /// Providers and addresses from configuration. Brevo is primary.
    pub fn from_config(config: &Config, client: &reqwest::Client) -> Self {
        let mut providers: Vec<Arc<dyn EmailProvider>> = Vec::new();
        if let Some(key) = &config.brevo_api_key {
            providers.push(Arc::new(BrevoProvider::new(client.clone(), key)));
        }
        if let Some(key) = &config.resend_api_key {
            providers.push(Arc::new(ResendProvider::new(client.clone(), key)));
        }

        let addresses = match (&config.from_email, &config.to_email) {
            (Some(from), Some(to)) => Some(Addresses {
                from: from.clone(),
                to: to.clone(),
            }),
            _ => None,
        };

        Self::new(providers, addresses, config.outbound_timeout)
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Send both emails for a submission, falling back across providers.
    pub async fn deliver(&self, contact: &ContactSubmission) -> DeliveryOutcome {
        let Some(addresses) = &self.addresses else {
            tracing::warn!("email not sent: FROM_EMAIL and TO_EMAIL are required");
            return DeliveryOutcome::NotConfigured;
        };
        if self.providers.is_empty() {
            tracing::warn!("email not sent: no email provider configured");
            return DeliveryOutcome::NotConfigured;
        }

        let submitted_at = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();
        let envelopes = build_envelopes(contact, addresses, &submitted_at);

        for provider in &self.providers {
            match self.send_all(provider.as_ref(), &envelopes).await {
                Ok(()) => {
                    return DeliveryOutcome::Sent {
                        provider: provider.name(),
                    };
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "email provider failed");
                }
            }
        }

        tracing::error!(
            providers = ?self.provider_names(),
            "all email providers failed; submission accepted without email"
        );
        DeliveryOutcome::Failed
    }

    /// Send the envelopes in order. Only the business email's failure fails
    /// the provider.
    async fn send_all(
        &self,
        provider: &dyn EmailProvider,
        envelopes: &[EmailEnvelope],
    ) -> Result<(), DeliveryError> {
        for envelope in envelopes {
            match self.send_one(provider, envelope).await {
                Ok(message_id) => {
                    record_delivery(provider.name(), "sent");
                    tracing::info!(
                        provider = provider.name(),
                        kind = envelope.kind.as_str(),
                        message_id = %message_id,
                        "email sent"
                    );
                }
                Err(e) => {
                    record_delivery(provider.name(), "failed");
                    if envelope.kind == EnvelopeKind::Business {
                        return Err(e);
                    }
                    tracing::warn!(
                        provider = provider.name(),
                        kind = envelope.kind.as_str(),
                        error = %e,
                        "confirmation email failed"
                    );
                }
            }
        }
        Ok(())
    }

    async fn send_one(
        &self,
        provider: &dyn EmailProvider,
        envelope: &EmailEnvelope,
    ) -> Result<String, DeliveryError> {
        tokio::time::timeout(self.timeout, provider.send(envelope))
            .await
            .map_err(|_| DeliveryError::Timeout(self.timeout))?
    }
}
