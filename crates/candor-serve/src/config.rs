//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use candor_core::Environment;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8787").
    pub bind_addr: String,

    /// Deployment environment; selects the origin allow-list.
    pub environment: Environment,

    /// Shared secret for contact form signatures. `None` is a server
    /// misconfiguration that the contact endpoint reports as 500.
    pub contact_form_secret: Option<String>,

    /// Brevo API key (primary email provider).
    pub brevo_api_key: Option<String>,

    /// Resend API key (fallback email provider).
    pub resend_api_key: Option<String>,

    /// Sender address for outbound email.
    pub from_email: Option<String>,

    /// Business inbox that receives contact notifications.
    pub to_email: Option<String>,

    /// Instagram Graph API access token for the gallery.
    pub instagram_access_token: Option<String>,

    /// How long gallery listings stay cached.
    pub image_cache_ttl: Duration,

    /// Upper bound on each outbound HTTP call.
    pub outbound_timeout: Duration,

    /// Maximum age of a signed contact submission.
    pub replay_max_age: Duration,

    /// Directory holding the built single-page app, if this process serves it.
    pub static_dir: Option<PathBuf>,

    /// Port for the Prometheus exporter, if enabled.
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8787".to_string(),
            environment: Environment::Development,
            contact_form_secret: None,
            brevo_api_key: None,
            resend_api_key: None,
            from_email: None,
            to_email: None,
            instagram_access_token: None,
            image_cache_ttl: Duration::from_secs(6 * 60 * 60),
            outbound_timeout: Duration::from_secs(10),
            replay_max_age: candor_core::replay::DEFAULT_MAX_AGE,
            static_dir: None,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Nothing is strictly required: absent providers and credentials are
    /// valid deployment states handled per endpoint.
    ///
    /// - `BIND_ADDR`: Server bind address (default: "0.0.0.0:8787")
    /// - `ENVIRONMENT`: `production` or anything else (default: development)
    /// - `CONTACT_FORM_SECRET`: HMAC secret shared with the browser
    /// - `BREVO_API_KEY`, `RESEND_API_KEY`: email providers
    /// - `FROM_EMAIL`, `TO_EMAIL`: sender and business inbox
    ///   (`BREVO_FROM_EMAIL`, `BREVO_TO_EMAIL` are accepted as fallbacks)
    /// - `INSTAGRAM_ACCESS_TOKEN`: gallery credential
    /// - `IMAGE_CACHE_TTL_SECS`: gallery cache TTL (default: 21600)
    /// - `OUTBOUND_TIMEOUT_SECS`: outbound HTTP timeout (default: 10)
    /// - `REPLAY_MAX_AGE_SECS`: signed submission max age (default: 600)
    /// - `STATIC_DIR`: serve the SPA from this directory
    /// - `METRICS_PORT`: enable the Prometheus exporter on this port
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);

        let environment = std::env::var("ENVIRONMENT")
            .unwrap_or_default()
            .parse()
            .unwrap_or_default();

        let from_email = non_empty_var("FROM_EMAIL").or_else(|| non_empty_var("BREVO_FROM_EMAIL"));
        let to_email = non_empty_var("TO_EMAIL").or_else(|| non_empty_var("BREVO_TO_EMAIL"));

        let image_cache_ttl = secs_var("IMAGE_CACHE_TTL_SECS")?.unwrap_or(defaults.image_cache_ttl);
        let outbound_timeout =
            secs_var("OUTBOUND_TIMEOUT_SECS")?.unwrap_or(defaults.outbound_timeout);
        let replay_max_age = secs_var("REPLAY_MAX_AGE_SECS")?.unwrap_or(defaults.replay_max_age);

        if outbound_timeout.is_zero() {
            anyhow::bail!("OUTBOUND_TIMEOUT_SECS must be greater than zero");
        }

        let metrics_port = non_empty_var("METRICS_PORT")
            .map(|v| {
                v.parse::<u16>()
                    .map_err(|e| anyhow::anyhow!("invalid METRICS_PORT '{v}': {e}"))
            })
            .transpose()?;

        let config = Self {
            bind_addr,
            environment,
            contact_form_secret: non_empty_var("CONTACT_FORM_SECRET"),
            brevo_api_key: non_empty_var("BREVO_API_KEY"),
            resend_api_key: non_empty_var("RESEND_API_KEY"),
            from_email,
            to_email,
            instagram_access_token: non_empty_var("INSTAGRAM_ACCESS_TOKEN"),
            image_cache_ttl,
            outbound_timeout,
            replay_max_age,
            static_dir: non_empty_var("STATIC_DIR").map(PathBuf::from),
            metrics_port,
        };

        if config.contact_form_secret.is_none() {
            tracing::error!("CONTACT_FORM_SECRET is not set; contact submissions will be refused");
        }

        tracing::info!(
            bind_addr = %config.bind_addr,
            environment = %config.environment,
            brevo = config.brevo_api_key.is_some(),
            resend = config.resend_api_key.is_some(),
            instagram = config.instagram_access_token.is_some(),
            image_cache_ttl_secs = config.image_cache_ttl.as_secs(),
            outbound_timeout_secs = config.outbound_timeout.as_secs(),
            static_dir = ?config.static_dir,
            "configuration loaded"
        );

        Ok(config)
    }
}

/// An environment variable with surrounding whitespace removed; unset and
/// empty are both `None`.
fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn secs_var(key: &str) -> anyhow::Result<Option<Duration>> {
    non_empty_var(key)
        .map(|v| {
            v.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| anyhow::anyhow!("invalid {key} '{v}': {e}"))
        })
        .transpose()
}
