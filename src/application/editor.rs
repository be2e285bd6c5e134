//! Admin post editor: validates drafts and forwards writes to the CMS.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tidings_api_types::PostWriteRequest;
use tracing::info;

use crate::application::render::extract_first_image;
use crate::application::repos::{ContentRepo, RepoError};
use crate::domain::document::Document;
use crate::domain::entities::{Post, PostDraft};
use crate::domain::error::DomainError;
use crate::domain::slug::slug_or_derive;

const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct EditorService {
    content: Arc<dyn ContentRepo>,
}

impl EditorService {
    pub fn new(content: Arc<dyn ContentRepo>) -> Self {
        Self { content }
    }

    pub async fn create(&self, token: &str, input: PostWriteRequest) -> Result<Post, EditorError> {
        let draft = build_draft(input)?;
        let post = self.content.create_post(token, &draft).await?;
        info!(
            target = "tidings::editor",
            post_id = post.id,
            slug = %post.slug,
            "post created"
        );
        Ok(post)
    }

    pub async fn update(
        &self,
        token: &str,
        key: &str,
        input: PostWriteRequest,
    ) -> Result<Post, EditorError> {
        let draft = build_draft(input)?;
        let post = self.content.update_post(token, key, &draft).await?;
        info!(
            target = "tidings::editor",
            post_id = post.id,
            slug = %post.slug,
            "post updated"
        );
        Ok(post)
    }

    pub async fn delete(&self, token: &str, key: &str) -> Result<(), EditorError> {
        self.content.delete_post(token, key).await?;
        info!(target = "tidings::editor", key = key, "post deleted");
        Ok(())
    }
}

/// Normalise an editor submission into a draft.
///
/// The featured image defaults to the first image in the body, and the slug
/// to one derived from the title.
pub fn build_draft(input: PostWriteRequest) -> Result<PostDraft, DomainError> {
    let title = input.title.trim().to_string();
    if title.is_empty() {
        return Err(DomainError::validation("title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(DomainError::validation(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }

    let slug = slug_or_derive(input.slug.as_deref(), &title)?;

    let content = normalize_content(input.content);
    let featured_image = input
        .featured_image
        .map(|src| src.trim().to_string())
        .filter(|src| !src.is_empty())
        .or_else(|| extract_first_image(&Document::from_value(&content)));

    let excerpt = input
        .excerpt
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    Ok(PostDraft {
        title,
        slug,
        content,
        excerpt,
        featured_image,
        category: input.category,
        tags: input.tags,
    })
}

/// JSON-encoded documents are stored decoded so the CMS keeps one shape.
fn normalize_content(content: Value) -> Value {
    if let Value::String(encoded) = &content
        && let Ok(decoded @ Value::Object(_)) = serde_json::from_str::<Value>(encoded)
    {
        return decoded;
    }
    content
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::test_support::{InMemoryContent, VALID_TOKEN, post};

    fn request(title: &str, content: Value) -> PostWriteRequest {
        PostWriteRequest {
            title: title.to_string(),
            slug: None,
            content,
            excerpt: None,
            featured_image: None,
            category: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn featured_image_defaults_to_first_body_image() {
        let draft = build_draft(request(
            "Trip Photos",
            json!({"type": "doc", "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "day one"}]},
                {"type": "image", "attrs": {"src": "data:image/png;base64,AAAA"}}
            ]}),
        ))
        .expect("valid draft");

        assert_eq!(draft.slug, "trip-photos");
        assert_eq!(
            draft.featured_image.as_deref(),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[test]
    fn explicit_featured_image_is_kept() {
        let mut input = request(
            "Post",
            json!({"type": "doc", "content": [{"type": "image", "attrs": {"src": "/body.png"}}]}),
        );
        input.featured_image = Some("/cover.png".to_string());
        let draft = build_draft(input).expect("valid draft");
        assert_eq!(draft.featured_image.as_deref(), Some("/cover.png"));
    }

    #[test]
    fn encoded_content_is_stored_decoded() {
        let encoded = r#"{"type":"doc","content":[]}"#;
        let draft = build_draft(request("Post", Value::String(encoded.to_string())))
            .expect("valid draft");
        assert_eq!(draft.content, json!({"type": "doc", "content": []}));

        let plain = build_draft(request("Post", json!("just text"))).expect("valid draft");
        assert_eq!(plain.content, json!("just text"));
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = build_draft(request("   ", Value::Null)).expect_err("blank title");
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[tokio::test]
    async fn create_and_delete_round_through_the_backend() {
        let content = Arc::new(InMemoryContent::default());
        let editor = EditorService::new(content.clone());

        let created = editor
            .create(VALID_TOKEN, request("New Post", Value::Null))
            .await
            .expect("create");
        assert_eq!(created.slug, "new-post");

        editor
            .delete(VALID_TOKEN, &created.write_key())
            .await
            .expect("delete");
        assert_eq!(
            content.deleted.lock().expect("deleted lock").as_slice(),
            [created.write_key()]
        );
    }

    #[tokio::test]
    async fn writes_with_bad_token_are_rejected() {
        let editor = EditorService::new(Arc::new(InMemoryContent::with_posts(vec![post(
            1, "a", "A",
        )])));
        let err = editor
            .update("bogus", "1", request("A", Value::Null))
            .await
            .expect_err("unauthorized");
        assert!(matches!(err, EditorError::Repo(RepoError::Unauthorized)));
    }
}
