//! Repository traits describing the content backend.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{AdminUser, AuthGrant, Category, Post, PostDraft, Tag};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("resource not found")]
    NotFound,
    #[error("credentials were rejected")]
    Unauthorized,
    #[error("content backend responded with {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("content backend unreachable: {0}")]
    Transport(String),
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl RepoError {
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

/// Narrows a post listing to one category or tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub category: Option<String>,
    pub tag: Option<String>,
}

impl PostFilter {
    pub fn category(slug: impl Into<String>) -> Self {
        Self {
            category: Some(slug.into()),
            tag: None,
        }
    }

    pub fn tag(slug: impl Into<String>) -> Self {
        Self {
            category: None,
            tag: Some(slug.into()),
        }
    }
}

/// 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub const MAX_PAGE_SIZE: u32 = 100;

    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, Self::MAX_PAGE_SIZE),
        }
    }
}

/// One page of results plus the totals reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_count: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_count: self.page_count,
            total: self.total,
        }
    }
}

#[async_trait]
pub trait ContentRepo: Send + Sync {
    /// Published posts, newest first.
    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError>;

    async fn find_post(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError>;

    async fn list_tags(&self) -> Result<Vec<Tag>, RepoError>;

    async fn create_post(&self, token: &str, draft: &PostDraft) -> Result<Post, RepoError>;

    async fn update_post(&self, token: &str, key: &str, draft: &PostDraft)
    -> Result<Post, RepoError>;

    async fn delete_post(&self, token: &str, key: &str) -> Result<(), RepoError>;

    async fn login(&self, identifier: &str, password: &str) -> Result<AuthGrant, RepoError>;

    async fn current_user(&self, token: &str) -> Result<AdminUser, RepoError>;
}
