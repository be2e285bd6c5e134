use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_CARD_EXCERPT_CHARS, DEFAULT_FEED_EXCERPT_CHARS, DEFAULT_META_DESCRIPTION_CHARS,
    RenderSettings,
};

/// Identifies where rendered output will be shown so the renderer can pick
/// the matching excerpt bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderTarget {
    /// Full post page: HTML body plus meta description.
    PostDetail,
    /// List card: excerpt and thumbnail only.
    PostCard,
    /// Syndication entry: description only.
    FeedEntry,
}

/// Excerpt bounds, in characters, per render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPipelineConfig {
    pub meta_description_chars: usize,
    pub card_excerpt_chars: usize,
    pub feed_excerpt_chars: usize,
}

impl Default for RenderPipelineConfig {
    fn default() -> Self {
        Self {
            meta_description_chars: DEFAULT_META_DESCRIPTION_CHARS,
            card_excerpt_chars: DEFAULT_CARD_EXCERPT_CHARS,
            feed_excerpt_chars: DEFAULT_FEED_EXCERPT_CHARS,
        }
    }
}

impl From<&RenderSettings> for RenderPipelineConfig {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            meta_description_chars: settings.meta_description_chars,
            card_excerpt_chars: settings.card_excerpt_chars,
            feed_excerpt_chars: settings.feed_excerpt_chars,
        }
    }
}

/// Everything derived from one post body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Present only for [`RenderTarget::PostDetail`].
    pub html: Option<String>,
    pub excerpt: String,
    pub first_image: Option<String>,
    /// The body was not a structured document and was rendered as text.
    pub fallback: bool,
}
