//! Domain entities decoded from CMS responses.

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::domain::{document::Document, relation::Relation};

/// A blog post as stored in the CMS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: u64,
    /// Stable identifier used by newer CMS versions for writes.
    pub document_id: Option<String>,
    pub slug: String,
    pub title: String,
    /// Raw editor document; decode with [`Post::document`].
    pub content: Value,
    /// Author-provided summary, if any.
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category: Option<Relation>,
    pub tags: Vec<Relation>,
    pub published_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}

impl Post {
    pub fn document(&self) -> Document {
        Document::from_value(&self.content)
    }

    /// Identifier the CMS expects in write paths.
    pub fn write_key(&self) -> String {
        self.document_id
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

/// Validated post fields ready to be written to the CMS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDraft {
    pub title: String,
    pub slug: String,
    pub content: Value,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category: Option<u64>,
    pub tags: Vec<u64>,
}

/// The CMS account behind an admin session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    pub id: u64,
    pub username: String,
    pub email: Option<String>,
}

/// Result of a successful login against the CMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub jwt: String,
    pub user: AdminUser,
}
