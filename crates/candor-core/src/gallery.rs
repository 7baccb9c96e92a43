//! Gallery image model.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum number of caption characters used for alt text.
pub const ALT_MAX_CHARS: usize = 100;

/// Alt text used when a caption yields nothing usable.
pub const ALT_FALLBACK: &str = "Instagram image";

/// Hashtags and mentions, stripped from alt text.
static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#@][A-Za-z0-9_]+").expect("tag regex should compile"));

/// An image as served to the browser gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub src: String,
    pub alt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl GalleryImage {
    /// Build an image, deriving alt text from the caption.
    pub fn new(id: Option<String>, src: String, caption: Option<String>) -> Self {
        let alt = alt_text(caption.as_deref());
        Self {
            id,
            src,
            alt,
            caption,
        }
    }
}

/// Alt text from a caption: the first [`ALT_MAX_CHARS`] characters with
/// `#tags` and `@mentions` removed, or [`ALT_FALLBACK`] if nothing is left.
pub fn alt_text(caption: Option<&str>) -> String {
    let Some(caption) = caption else {
        return ALT_FALLBACK.to_string();
    };

    let head: String = caption.chars().take(ALT_MAX_CHARS).collect();
    let stripped = TAG_REGEX.replace_all(&head, "");
    let trimmed = stripped.trim();

    if trimmed.is_empty() {
        ALT_FALLBACK.to_string()
    } else {
        trimmed.to_string()
    }
}
