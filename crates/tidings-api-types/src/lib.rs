//! Wire types shared by the tidings HTTP API and its clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// A category or tag as exposed to readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostCardResponse {
    pub id: u64,
    /// Path segment for `PUT`/`DELETE /admin/posts/{key}`.
    pub key: String,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub thumbnail: Option<String>,
    pub category: Option<TaxonomyResponse>,
    pub tags: Vec<TaxonomyResponse>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostListResponse {
    pub items: Vec<PostCardResponse>,
    pub page: u32,
    pub page_count: u32,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub id: u64,
    pub key: String,
    pub slug: String,
    pub title: String,
    pub html: String,
    pub meta_description: String,
    pub featured_image: Option<String>,
    pub category: Option<TaxonomyResponse>,
    pub tags: Vec<TaxonomyResponse>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUserResponse {
    pub id: u64,
    pub username: String,
    pub email: Option<String>,
}

/// Body accepted by the admin create/update endpoints.
///
/// `content` is the editor's rich-text document, either as a JSON object or
/// as a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWriteRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    /// Identifier of the category entity in the CMS.
    #[serde(default)]
    pub category: Option<u64>,
    /// Identifiers of the tag entities in the CMS.
    #[serde(default)]
    pub tags: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWriteResponse {
    pub id: u64,
    pub key: String,
    pub slug: String,
    pub featured_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
