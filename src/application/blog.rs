//! Public blog reads: post cards, post detail and taxonomy browsing.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::instrument;

use crate::application::render::{DocumentRenderer, RenderTarget};
use crate::application::repos::{ContentRepo, Page, PageRequest, PostFilter, RepoError};
use crate::domain::entities::{Category, Post, Tag};
use crate::domain::relation::Relation;

/// Shown on cards whose post has neither an excerpt nor any body text.
pub const EMPTY_EXCERPT_PLACEHOLDER: &str = "내용 없음";

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("post `{0}` not found")]
    NotFound(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostCard {
    pub id: u64,
    /// Identifier accepted by the admin write endpoints.
    pub key: String,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub thumbnail: Option<String>,
    pub category: Option<Relation>,
    pub tags: Vec<Relation>,
    pub published_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostDetail {
    pub id: u64,
    pub key: String,
    pub slug: String,
    pub title: String,
    pub html: String,
    pub meta_description: String,
    pub featured_image: Option<String>,
    pub category: Option<Relation>,
    pub tags: Vec<Relation>,
    pub published_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Clone)]
pub struct BlogService {
    content: Arc<dyn ContentRepo>,
    renderer: DocumentRenderer,
    page_size: u32,
}

impl BlogService {
    pub fn new(content: Arc<dyn ContentRepo>, renderer: DocumentRenderer, page_size: u32) -> Self {
        Self {
            content,
            renderer,
            page_size,
        }
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn list(&self, filter: PostFilter, page: u32) -> Result<Page<PostCard>, BlogError> {
        let posts = self
            .content
            .list_posts(&filter, PageRequest::new(page, self.page_size))
            .await?;
        Ok(posts.map(|post| self.card(post)))
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn detail(&self, slug: &str) -> Result<PostDetail, BlogError> {
        let post = self
            .content
            .find_post(slug)
            .await?
            .ok_or_else(|| BlogError::NotFound(slug.to_string()))?;

        let rendered = self.renderer.render(&post.content, RenderTarget::PostDetail);
        let meta_description = match non_empty(post.excerpt.as_deref()) {
            Some(excerpt) => {
                truncate_excerpt(excerpt, self.renderer.config().meta_description_chars)
            }
            None => rendered.excerpt,
        };

        Ok(PostDetail {
            id: post.id,
            key: post.write_key(),
            html: rendered.html.unwrap_or_default(),
            meta_description,
            featured_image: post.featured_image.or(rendered.first_image),
            slug: post.slug,
            title: post.title,
            category: post.category,
            tags: post.tags,
            published_at: post.published_at,
            updated_at: post.updated_at,
        })
    }

    pub async fn categories(&self) -> Result<Vec<Category>, BlogError> {
        Ok(self.content.list_categories().await?)
    }

    pub async fn tags(&self) -> Result<Vec<Tag>, BlogError> {
        Ok(self.content.list_tags().await?)
    }

    fn card(&self, post: Post) -> PostCard {
        let rendered = self.renderer.render(&post.content, RenderTarget::PostCard);
        let excerpt = match non_empty(post.excerpt.as_deref()) {
            Some(excerpt) => truncate_excerpt(excerpt, self.renderer.config().card_excerpt_chars),
            None if rendered.excerpt.is_empty() => EMPTY_EXCERPT_PLACEHOLDER.to_string(),
            None => rendered.excerpt,
        };

        PostCard {
            id: post.id,
            key: post.write_key(),
            slug: post.slug,
            title: post.title,
            excerpt,
            thumbnail: post.featured_image.or(rendered.first_image),
            category: post.category,
            tags: post.tags,
            published_at: post.published_at,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn truncate_excerpt(excerpt: &str, limit: usize) -> String {
    crate::application::render::extract_plain_text(
        &crate::domain::document::Document::Raw(excerpt.to_string()),
        limit,
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::test_support::{InMemoryContent, post};

    fn service(content: InMemoryContent) -> BlogService {
        BlogService::new(Arc::new(content), DocumentRenderer::default(), 10)
    }

    #[tokio::test]
    async fn cards_fall_back_to_first_image_and_body_text() {
        let mut entry = post(1, "hello", "Hello");
        entry.content = json!({
            "type": "doc",
            "content": [
                {"type": "image", "attrs": {"src": "/cover.png"}},
                {"type": "paragraph", "content": [{"type": "text", "text": "Body text"}]}
            ]
        });
        let blog = service(InMemoryContent::with_posts(vec![entry]));

        let page = blog.list(PostFilter::default(), 1).await.expect("list");
        let card = &page.items[0];
        assert_eq!(card.excerpt, "Body text");
        assert_eq!(card.thumbnail.as_deref(), Some("/cover.png"));
    }

    #[tokio::test]
    async fn explicit_excerpt_and_featured_image_win() {
        let mut entry = post(1, "hello", "Hello");
        entry.excerpt = Some("  Written summary ".to_string());
        entry.featured_image = Some("/featured.png".to_string());
        entry.content = json!({"type": "doc", "content": [{"type": "image", "attrs": {"src": "/body.png"}}]});
        let blog = service(InMemoryContent::with_posts(vec![entry]));

        let page = blog.list(PostFilter::default(), 1).await.expect("list");
        assert_eq!(page.items[0].excerpt, "Written summary");
        assert_eq!(page.items[0].thumbnail.as_deref(), Some("/featured.png"));
    }

    #[tokio::test]
    async fn empty_posts_get_placeholder_excerpt() {
        let mut entry = post(1, "empty", "Empty");
        entry.content = json!(null);
        let blog = service(InMemoryContent::with_posts(vec![entry]));

        let page = blog.list(PostFilter::default(), 1).await.expect("list");
        assert_eq!(page.items[0].excerpt, EMPTY_EXCERPT_PLACEHOLDER);
    }

    #[tokio::test]
    async fn detail_renders_html_and_meta_description() {
        let mut entry = post(1, "hello", "Hello");
        entry.content = json!({
            "type": "doc",
            "content": [{"type": "paragraph", "content": [{"type": "text", "text": "World"}]}]
        });
        let blog = service(InMemoryContent::with_posts(vec![entry]));

        let detail = blog.detail("hello").await.expect("detail");
        assert_eq!(detail.html, "<p>World</p>");
        assert_eq!(detail.meta_description, "World");
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let blog = service(InMemoryContent::default());
        let err = blog.detail("missing").await.expect_err("missing post");
        assert!(matches!(err, BlogError::NotFound(slug) if slug == "missing"));
    }

    #[tokio::test]
    async fn filters_reach_the_repository() {
        let mut tech = post(1, "a", "A");
        tech.category = Some(Relation {
            id: Some(1),
            name: "Tech".to_string(),
            slug: Some("tech".to_string()),
        });
        let other = post(2, "b", "B");
        let blog = service(InMemoryContent::with_posts(vec![tech, other]));

        let page = blog
            .list(PostFilter::category("tech"), 1)
            .await
            .expect("list");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].slug, "a");
    }
}
