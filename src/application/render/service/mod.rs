mod html;
mod image;
mod text;

use metrics::counter;
use serde_json::Value;
use tracing::debug;

use crate::application::render::types::{RenderOutput, RenderPipelineConfig, RenderTarget};
use crate::domain::document::Document;

pub use html::render_to_html;
pub use image::extract_first_image;
pub use text::extract_plain_text;

/// Renders stored post bodies for the presentation layer.
///
/// Construct one from configuration and hand it to the services that need
/// it; it holds no state beyond its excerpt bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentRenderer {
    config: RenderPipelineConfig,
}

impl DocumentRenderer {
    pub fn new(config: RenderPipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderPipelineConfig {
        &self.config
    }

    /// Render a post body for `target`. Never fails: malformed bodies come
    /// back as escaped text with `fallback` set.
    pub fn render(&self, content: &Value, target: RenderTarget) -> RenderOutput {
        let document = Document::from_value(content);
        let fallback = matches!(&document, Document::Raw(body) if !body.trim().is_empty());
        if fallback {
            counter!("tidings_render_fallback_total").increment(1);
            debug!(
                target = "tidings::render",
                render_target = ?target,
                "post body is not a structured document; rendering as text"
            );
        }

        let (html, limit) = match target {
            RenderTarget::PostDetail => (
                Some(render_to_html(&document)),
                self.config.meta_description_chars,
            ),
            RenderTarget::PostCard => (None, self.config.card_excerpt_chars),
            RenderTarget::FeedEntry => (None, self.config.feed_excerpt_chars),
        };

        RenderOutput {
            html,
            excerpt: extract_plain_text(&document, limit),
            first_image: extract_first_image(&document),
            fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Value {
        json!({
            "type": "doc",
            "content": [
                {"type": "heading", "attrs": {"level": 1}, "content": [{"type": "text", "text": "Hello"}]},
                {"type": "image", "attrs": {"src": "https://x/y.png"}},
                {"type": "paragraph", "content": [{"type": "text", "text": "World", "marks": [{"type": "bold"}]}]}
            ]
        })
    }

    #[test]
    fn detail_target_renders_html_and_meta_description() {
        let renderer = DocumentRenderer::default();
        let output = renderer.render(&sample(), RenderTarget::PostDetail);

        assert_eq!(
            output.html.as_deref(),
            Some("<h1>Hello</h1><img src=\"https://x/y.png\"/><p><strong>World</strong></p>")
        );
        assert_eq!(output.excerpt, "Hello World");
        assert_eq!(output.first_image.as_deref(), Some("https://x/y.png"));
        assert!(!output.fallback);
    }

    #[test]
    fn card_target_uses_card_bound_and_skips_html() {
        let renderer = DocumentRenderer::new(RenderPipelineConfig {
            card_excerpt_chars: 5,
            ..RenderPipelineConfig::default()
        });
        let output = renderer.render(&sample(), RenderTarget::PostCard);

        assert_eq!(output.html, None);
        assert_eq!(output.excerpt, "Hello...");
    }

    #[test]
    fn encoded_string_bodies_are_structured() {
        let renderer = DocumentRenderer::default();
        let encoded = Value::String(sample().to_string());
        let output = renderer.render(&encoded, RenderTarget::FeedEntry);

        assert_eq!(output.excerpt, "Hello World");
        assert!(!output.fallback);
    }

    #[test]
    fn malformed_bodies_fall_back_to_text() {
        let renderer = DocumentRenderer::default();
        let output = renderer.render(&json!("not json {"), RenderTarget::PostDetail);

        assert_eq!(output.html.as_deref(), Some("<p>not json {</p>"));
        assert_eq!(output.excerpt, "not json {");
        assert_eq!(output.first_image, None);
        assert!(output.fallback);
    }

    #[test]
    fn null_bodies_render_empty() {
        let output = DocumentRenderer::default().render(&Value::Null, RenderTarget::PostDetail);
        assert_eq!(output.html.as_deref(), Some(""));
        assert_eq!(output.excerpt, "");
        assert!(!output.fallback);
    }
}
