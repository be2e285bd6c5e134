//! Syndication service for RSS feed generation.
//!
//! Feed descriptions are plain-text excerpts of the post body so readers see
//! a summary rather than raw editor markup.

use std::sync::Arc;

use thiserror::Error;
use time::format_description::well_known::Rfc2822;

use crate::application::render::{DocumentRenderer, RenderTarget};
use crate::application::repos::{ContentRepo, PageRequest, PostFilter, RepoError};

#[derive(Debug, Clone)]
pub struct FeedChannel {
    pub title: String,
    pub description: String,
    pub public_url: String,
    pub limit: u32,
}

#[derive(Clone)]
pub struct SyndicationService {
    content: Arc<dyn ContentRepo>,
    renderer: DocumentRenderer,
    channel: FeedChannel,
}

#[derive(Debug, Error)]
pub enum SyndicationError {
    #[error("failed to list posts: {0}")]
    Posts(#[from] RepoError),
}

impl SyndicationService {
    pub fn new(
        content: Arc<dyn ContentRepo>,
        renderer: DocumentRenderer,
        channel: FeedChannel,
    ) -> Self {
        Self {
            content,
            renderer,
            channel,
        }
    }

    /// Generate RSS 2.0 feed XML for the most recent posts.
    pub async fn rss_feed(&self) -> Result<String, SyndicationError> {
        let base = normalize_public_site_url(&self.channel.public_url);
        let page = self
            .content
            .list_posts(
                &PostFilter::default(),
                PageRequest::new(1, self.channel.limit),
            )
            .await?;

        let mut items = String::new();
        for post in page.items {
            let rendered = self.renderer.render(&post.content, RenderTarget::FeedEntry);
            let link = format!("{base}posts/{}", post.slug);
            let pub_date = post
                .published_at
                .or(post.updated_at)
                .and_then(|stamp| stamp.format(&Rfc2822).ok())
                .map(|stamp| format!("      <pubDate>{stamp}</pubDate>\n"))
                .unwrap_or_default();
            let category = post
                .category
                .as_ref()
                .map(|category| {
                    format!("      <category>{}</category>\n", xml_escape(&category.name))
                })
                .unwrap_or_default();

            items.push_str(&format!(
                "    <item>\n      <title>{}</title>\n      <link>{}</link>\n      <guid>{}</guid>\n{}{}      <description>{}</description>\n    </item>\n",
                xml_escape(&post.title),
                xml_escape(&link),
                xml_escape(&link),
                pub_date,
                category,
                xml_escape(&rendered.excerpt),
            ));
        }

        Ok(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n  <channel>\n    <title>{}</title>\n    <link>{}</link>\n    <description>{}</description>\n{}  </channel>\n</rss>\n",
            xml_escape(&self.channel.title),
            xml_escape(&base),
            xml_escape(&self.channel.description),
            items
        ))
    }
}

fn normalize_public_site_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    format!("{trimmed}/")
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::datetime;

    use super::*;
    use crate::application::test_support::{InMemoryContent, post};
    use crate::domain::relation::Relation;

    fn channel(limit: u32) -> FeedChannel {
        FeedChannel {
            title: "My <Blog>".to_string(),
            description: "Notes".to_string(),
            public_url: "https://blog.example.com/".to_string(),
            limit,
        }
    }

    #[tokio::test]
    async fn feed_items_carry_plain_text_descriptions() {
        let mut entry = post(1, "first-post", "First & best");
        entry.published_at = Some(datetime!(2024-03-01 09:30 UTC));
        entry.category = Some(Relation {
            id: Some(2),
            name: "Tech".to_string(),
            slug: Some("tech".to_string()),
        });
        entry.content = json!({
            "type": "doc",
            "content": [{"type": "paragraph", "content": [
                {"type": "text", "text": "Rust <3", "marks": [{"type": "bold"}]}
            ]}]
        });

        let service = SyndicationService::new(
            Arc::new(InMemoryContent::with_posts(vec![entry])),
            DocumentRenderer::default(),
            channel(20),
        );
        let xml = service.rss_feed().await.expect("feed");

        assert!(xml.contains("<title>My &lt;Blog&gt;</title>"));
        assert!(xml.contains("<link>https://blog.example.com/</link>"));
        assert!(xml.contains("<title>First &amp; best</title>"));
        assert!(xml.contains("<link>https://blog.example.com/posts/first-post</link>"));
        assert!(xml.contains("<pubDate>Fri, 01 Mar 2024 09:30:00 +0000</pubDate>"));
        assert!(xml.contains("<category>Tech</category>"));
        assert!(xml.contains("<description>Rust &lt;3</description>"));
    }

    #[tokio::test]
    async fn feed_respects_limit() {
        let posts = (1..=5)
            .map(|id| post(id, &format!("post-{id}"), "Post"))
            .collect();
        let service = SyndicationService::new(
            Arc::new(InMemoryContent::with_posts(posts)),
            DocumentRenderer::default(),
            channel(2),
        );
        let xml = service.rss_feed().await.expect("feed");
        assert_eq!(xml.matches("<item>").count(), 2);
    }
}
