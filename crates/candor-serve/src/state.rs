//! Shared application state.

use std::sync::Arc;

use candor_core::ReplayWindow;

use crate::cache::{CacheEngine, CacheStore, MemoryStore};
use crate::config::Config;
use crate::gallery::{GallerySource, InstagramSource};
use crate::relay::Mailer;

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// Cache-or-fetch engine over the process-local store.
    pub cache: CacheEngine,

    /// Upstream for the image gallery.
    pub gallery: Arc<dyn GallerySource>,

    /// Outbound email with provider fallback.
    pub mailer: Arc<Mailer>,

    /// Freshness window for signed submissions.
    pub replay: ReplayWindow,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// One HTTP client is shared by the gallery source and both email
    /// providers; its timeout bounds every outbound call.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.outbound_timeout)
            .user_agent(concat!("candor-serve/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mailer = Mailer::from_config(&config, &client);
        tracing::info!(providers = ?mailer.provider_names(), "email providers configured");

        Ok(Self::with_parts(
            config,
            Arc::new(MemoryStore::default()),
            Arc::new(InstagramSource::new(client)),
            mailer,
        ))
    }

    /// Assemble state from explicit parts.
    pub fn with_parts(
        config: Config,
        store: Arc<dyn CacheStore>,
        gallery: Arc<dyn GallerySource>,
        mailer: Mailer,
    ) -> Self {
        let replay = ReplayWindow::new(config.replay_max_age);
        Self {
            config: Arc::new(config),
            cache: CacheEngine::new(store),
            gallery,
            mailer: Arc::new(mailer),
            replay,
        }
    }
}
