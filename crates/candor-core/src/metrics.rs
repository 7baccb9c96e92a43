//! Prometheus metrics helpers.
//!
//! # Usage
//!
//! ```rust,ignore
//! use candor_core::metrics::{start_metrics_server, try_init_metrics};
//!
//! if let Some(handle) = try_init_metrics() {
//!     start_metrics_server(9091, handle).await?;
//! }
//!
//! metrics::counter!("contact_submissions_total").increment(1);
//! ```
//!
//! # Metric Naming Conventions
//!
//! - Prefix: component (`contact_`, `email_`, `cache_`, `gallery_`)
//! - Suffix: `_total` for counters
//! - Labels: low-cardinality only (reason, provider, outcome)

use std::net::SocketAddr;

use axum::{Router, routing::get};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Accepted contact submissions.
pub const CONTACT_SUBMISSIONS: &str = "contact_submissions_total";
/// Rejected contact submissions (label: reason).
pub const CONTACT_REJECTIONS: &str = "contact_rejections_total";
/// Email delivery attempts (labels: provider, outcome).
pub const EMAIL_DELIVERIES: &str = "email_deliveries_total";
/// Fresh cache hits.
pub const CACHE_HITS: &str = "cache_hits_total";
/// Cache misses that invoked the factory.
pub const CACHE_MISSES: &str = "cache_misses_total";
/// Stale entries served after a factory failure.
pub const CACHE_STALE_SERVED: &str = "cache_stale_served_total";
/// Failed upstream gallery fetches.
pub const GALLERY_FETCH_ERRORS: &str = "gallery_fetch_errors_total";

/// Initialize the Prometheus metrics recorder.
///
/// Returns `None` if a recorder is already installed.
pub fn try_init_metrics() -> Option<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder().ok()?;
    register_metrics();
    Some(handle)
}

/// Serve `/metrics` on `port` from a background task.
///
/// The listener is bound before returning so that bind errors surface to the
/// caller.
pub async fn start_metrics_server(
    port: u16,
    handle: PrometheusHandle,
) -> Result<(), std::io::Error> {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on http://{}/metrics", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "metrics server stopped");
        }
    });

    Ok(())
}

fn register_metrics() {
    // =========================================================================
    // Contact relay
    // =========================================================================

    describe_counter!(CONTACT_SUBMISSIONS, "Contact submissions accepted");
    describe_counter!(
        CONTACT_REJECTIONS,
        "Contact submissions rejected (label: reason)"
    );
    describe_counter!(
        EMAIL_DELIVERIES,
        "Email delivery attempts (labels: provider, outcome)"
    );

    // =========================================================================
    // Cache-or-fetch
    // =========================================================================

    describe_counter!(CACHE_HITS, "Fresh cache hits");
    describe_counter!(CACHE_MISSES, "Cache misses that invoked the factory");
    describe_counter!(
        CACHE_STALE_SERVED,
        "Expired entries served because the factory failed"
    );
    describe_counter!(GALLERY_FETCH_ERRORS, "Failed upstream gallery fetches");
}

/// Count a rejected contact submission.
#[inline]
pub fn record_rejection(reason: &'static str) {
    metrics::counter!(CONTACT_REJECTIONS, "reason" => reason).increment(1);
}

/// Count an email delivery attempt.
#[inline]
pub fn record_delivery(provider: &'static str, outcome: &'static str) {
    metrics::counter!(EMAIL_DELIVERIES, "provider" => provider, "outcome" => outcome).increment(1);
}

/// Increment a counter without labels.
#[inline]
pub fn increment(name: &'static str) {
    metrics::counter!(name).increment(1);
}
