//! In-memory content backend shared by unit and integration tests.
//!
//! Enabled for the crate's own tests and, for integration tests, through the
//! `test-support` feature.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::application::repos::{ContentRepo, Page, PageRequest, PostFilter, RepoError};
use crate::domain::entities::{AdminUser, AuthGrant, Category, Post, PostDraft, Tag};

/// The only session token the fake backend accepts.
pub const VALID_TOKEN: &str = "valid-token";

pub fn post(id: u64, slug: &str, title: &str) -> Post {
    Post {
        id,
        document_id: None,
        slug: slug.to_string(),
        title: title.to_string(),
        content: Value::Null,
        excerpt: None,
        featured_image: None,
        category: None,
        tags: Vec::new(),
        published_at: None,
        updated_at: None,
    }
}

pub fn admin() -> AdminUser {
    AdminUser {
        id: 1,
        username: "admin".to_string(),
        email: Some("admin@example.com".to_string()),
    }
}

#[derive(Default)]
pub struct InMemoryContent {
    pub posts: Mutex<Vec<Post>>,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    pub deleted: Mutex<Vec<String>>,
    /// Make `list_tags` fail as if the CMS were unreachable.
    pub tags_unavailable: bool,
}

impl InMemoryContent {
    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: Mutex::new(posts),
            ..Self::default()
        }
    }

    fn check_token(token: &str) -> Result<(), RepoError> {
        if token == VALID_TOKEN {
            Ok(())
        } else {
            Err(RepoError::Unauthorized)
        }
    }

    /// Created posts get a document id, as on CMS versions that route writes
    /// by it.
    fn draft_to_post(id: u64, draft: &PostDraft) -> Post {
        Post {
            document_id: Some(format!("doc-{id}")),
            excerpt: draft.excerpt.clone(),
            featured_image: draft.featured_image.clone(),
            content: draft.content.clone(),
            ..post(id, &draft.slug, &draft.title)
        }
    }
}

#[async_trait]
impl ContentRepo for InMemoryContent {
    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let posts = self.posts.lock().expect("posts lock");
        let matching: Vec<Post> = posts
            .iter()
            .filter(|post| match &filter.category {
                Some(slug) => post
                    .category
                    .as_ref()
                    .is_some_and(|category| category.slug.as_deref() == Some(slug.as_str())),
                None => true,
            })
            .filter(|post| match &filter.tag {
                Some(slug) => post
                    .tags
                    .iter()
                    .any(|tag| tag.slug.as_deref() == Some(slug.as_str())),
                None => true,
            })
            .cloned()
            .collect();

        let total = matching.len() as u64;
        let size = page.page_size as usize;
        let items = matching
            .into_iter()
            .skip((page.page as usize - 1) * size)
            .take(size)
            .collect();
        Ok(Page {
            items,
            page: page.page,
            page_count: total.div_ceil(u64::from(page.page_size)) as u32,
            total,
        })
    }

    async fn find_post(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let posts = self.posts.lock().expect("posts lock");
        Ok(posts.iter().find(|post| post.slug == slug).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        Ok(self.categories.clone())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, RepoError> {
        if self.tags_unavailable {
            return Err(RepoError::Transport("connection refused".to_string()));
        }
        Ok(self.tags.clone())
    }

    async fn create_post(&self, token: &str, draft: &PostDraft) -> Result<Post, RepoError> {
        Self::check_token(token)?;
        let mut posts = self.posts.lock().expect("posts lock");
        let created = Self::draft_to_post(posts.len() as u64 + 1, draft);
        posts.push(created.clone());
        Ok(created)
    }

    async fn update_post(
        &self,
        token: &str,
        key: &str,
        draft: &PostDraft,
    ) -> Result<Post, RepoError> {
        Self::check_token(token)?;
        let mut posts = self.posts.lock().expect("posts lock");
        let existing = posts
            .iter_mut()
            .find(|post| post.write_key() == key)
            .ok_or(RepoError::NotFound)?;
        *existing = Post {
            document_id: existing.document_id.clone(),
            ..Self::draft_to_post(existing.id, draft)
        };
        Ok(existing.clone())
    }

    async fn delete_post(&self, token: &str, key: &str) -> Result<(), RepoError> {
        Self::check_token(token)?;
        let mut posts = self.posts.lock().expect("posts lock");
        let before = posts.len();
        posts.retain(|post| post.write_key() != key);
        if posts.len() == before {
            return Err(RepoError::NotFound);
        }
        self.deleted.lock().expect("deleted lock").push(key.to_string());
        Ok(())
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<AuthGrant, RepoError> {
        if identifier == "admin" && password == "secret" {
            Ok(AuthGrant {
                jwt: VALID_TOKEN.to_string(),
                user: admin(),
            })
        } else {
            Err(RepoError::Unauthorized)
        }
    }

    async fn current_user(&self, token: &str) -> Result<AdminUser, RepoError> {
        Self::check_token(token)?;
        Ok(admin())
    }
}
