//! Gallery images from the Instagram Graph API, behind the cache engine.

use std::time::Duration;

use async_trait::async_trait;
use candor_core::GalleryImage;
use candor_core::metrics::{self as m, GALLERY_FETCH_ERRORS};
use serde::Deserialize;

use crate::cache::CacheEngine;

/// Cache namespace for gallery listings.
pub const IMAGE_NAMESPACE: &str = "instagram";

/// Number of credential characters used in cache keys.
pub const KEY_FRAGMENT_CHARS: usize = 8;

/// Default and bounds for `?limit=`.
pub const DEFAULT_LIMIT: u32 = 6;
pub const MAX_LIMIT: u32 = 50;

const GRAPH_MEDIA_URL: &str = "https://graph.instagram.com/me/media";
const MEDIA_FIELDS: &str = "id,media_type,media_url,permalink,caption,timestamp";

/// Upstream image provider failure.
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Produces the gallery listing for a credential.
#[async_trait]
pub trait GallerySource: Send + Sync {
    async fn fetch(&self, credential: &str, limit: u32) -> Result<Vec<GalleryImage>, GalleryError>;
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    #[serde(default)]
    data: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
struct MediaItem {
    id: Option<String>,
    media_type: Option<String>,
    media_url: Option<String>,
    caption: Option<String>,
}

/// Instagram Graph API media listing.
#[derive(Clone)]
pub struct InstagramSource {
    client: reqwest::Client,
    media_url: String,
}

impl InstagramSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            media_url: GRAPH_MEDIA_URL.to_string(),
        }
    }
}

#[async_trait]
impl GallerySource for InstagramSource {
    async fn fetch(&self, credential: &str, limit: u32) -> Result<Vec<GalleryImage>, GalleryError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(&self.media_url)
            .query(&[
                ("fields", MEDIA_FIELDS),
                ("limit", limit.as_str()),
                ("access_token", credential),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GalleryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let media: MediaResponse = response.json().await?;
        let images = images_from_media(media);
        tracing::info!(count = images.len(), "fetched images from Instagram");
        Ok(images)
    }
}

/// Keep still images only and convert them to gallery entries.
fn images_from_media(media: MediaResponse) -> Vec<GalleryImage> {
    media
        .data
        .into_iter()
        .filter(|item| item.media_type.as_deref() == Some("IMAGE"))
        .filter_map(|item| {
            let src = item.media_url?;
            Some(GalleryImage::new(item.id, src, item.caption))
        })
        .collect()
}

/// Cache key for a listing: a fixed-length credential fragment and the page
/// size, so the full credential is never used as a key.
pub fn image_cache_key(credential: &str, limit: u32) -> String {
    let fragment: String = credential.chars().take(KEY_FRAGMENT_CHARS).collect();
    format!("{fragment}:{limit}")
}

/// Parse `?limit=`: absent or unparseable gives the default, otherwise
/// clamped to `1..=MAX_LIMIT`.
pub fn parse_limit(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .map(|n| n.clamp(1, i64::from(MAX_LIMIT)) as u32)
        .unwrap_or(DEFAULT_LIMIT)
}

/// Gallery listing through the cache. Upstream failures are logged and
/// answered from a stale entry or with an empty list.
pub async fn cached_images(
    cache: &CacheEngine,
    source: &dyn GallerySource,
    credential: &str,
    limit: u32,
    ttl: Duration,
) -> Vec<GalleryImage> {
    let key = image_cache_key(credential, limit);
    cache
        .get_or_set(
            &key,
            || async {
                source.fetch(credential, limit).await.inspect_err(|e| {
                    m::increment(GALLERY_FETCH_ERRORS);
                    tracing::error!(error = %e, "Instagram fetch failed");
                })
            },
            ttl,
            Some(IMAGE_NAMESPACE),
        )
        .await
}
