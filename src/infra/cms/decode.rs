//! Response decoding for the CMS REST API.
//!
//! Entries arrive either nested (`{ id, attributes: { .. } }`) or flattened
//! (`{ id, documentId, .. }`) depending on the CMS major version. Both shapes
//! are normalized here into domain entities; nothing outside this module sees
//! the envelope.

use serde_json::{Map, Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    application::repos::{Page, RepoError},
    domain::{
        entities::{AdminUser, AuthGrant, Category, Post, PostDraft, Tag},
        relation::Relation,
        slug::derive_slug,
    },
};

/// Decode a `{ data: [..], meta: { pagination } }` listing of posts.
pub(crate) fn post_page(body: &Value) -> Result<Page<Post>, RepoError> {
    let items = data_array(body)?
        .iter()
        .map(post)
        .collect::<Result<Vec<_>, _>>()?;

    let pagination = body.pointer("/meta/pagination");
    let number = |key: &str| pagination.and_then(|p| p.get(key)).and_then(Value::as_u64);

    let total = number("total").unwrap_or(items.len() as u64);
    let page = number("page").unwrap_or(1);
    let page_count = number("pageCount").unwrap_or(u64::from(!items.is_empty()));

    Ok(Page {
        items,
        page: u32::try_from(page).unwrap_or(u32::MAX),
        page_count: u32::try_from(page_count).unwrap_or(u32::MAX),
        total,
    })
}

/// First post of a listing, if any.
pub(crate) fn first_post(body: &Value) -> Result<Option<Post>, RepoError> {
    data_array(body)?.first().map(post).transpose()
}

/// Decode a `{ data: { .. } }` single-entry response.
pub(crate) fn single_post(body: &Value) -> Result<Post, RepoError> {
    let entry = body
        .get("data")
        .ok_or_else(|| RepoError::decode("response has no `data` member"))?;
    post(entry)
}

pub(crate) fn post(entry: &Value) -> Result<Post, RepoError> {
    let fields = flatten_entry(entry)?;

    Ok(Post {
        id: required_id(&fields)?,
        document_id: optional_string(&fields, "documentId"),
        slug: required_string(&fields, "slug")?,
        title: required_string(&fields, "title")?,
        content: fields.get("content").cloned().unwrap_or(Value::Null),
        excerpt: optional_string(&fields, "excerpt"),
        featured_image: fields.get("featuredImage").and_then(media_url),
        category: fields.get("category").and_then(Relation::decode),
        tags: fields
            .get("tags")
            .map(Relation::decode_many)
            .unwrap_or_default(),
        published_at: optional_datetime(&fields, "publishedAt")?,
        updated_at: optional_datetime(&fields, "updatedAt")?,
    })
}

pub(crate) fn categories(body: &Value) -> Result<Vec<Category>, RepoError> {
    data_array(body)?
        .iter()
        .map(|entry| {
            let (id, name, slug) = taxonomy(entry)?;
            Ok(Category { id, name, slug })
        })
        .collect()
}

pub(crate) fn tags(body: &Value) -> Result<Vec<Tag>, RepoError> {
    data_array(body)?
        .iter()
        .map(|entry| {
            let (id, name, slug) = taxonomy(entry)?;
            Ok(Tag { id, name, slug })
        })
        .collect()
}

pub(crate) fn user(body: &Value) -> Result<AdminUser, RepoError> {
    let fields = body
        .as_object()
        .ok_or_else(|| RepoError::decode("user is not an object"))?;
    Ok(AdminUser {
        id: required_id(fields)?,
        username: required_string(fields, "username")?,
        email: optional_string(fields, "email"),
    })
}

pub(crate) fn auth_grant(body: &Value) -> Result<AuthGrant, RepoError> {
    let jwt = body
        .get("jwt")
        .and_then(Value::as_str)
        .filter(|jwt| !jwt.is_empty())
        .ok_or_else(|| RepoError::decode("login response has no `jwt`"))?;
    let user = user(body.get("user").unwrap_or(&Value::Null))?;
    Ok(AuthGrant {
        jwt: jwt.to_string(),
        user,
    })
}

/// Request body for post writes.
pub(crate) fn draft_body(draft: &PostDraft) -> Value {
    json!({
        "data": {
            "title": draft.title,
            "slug": draft.slug,
            "content": draft.content,
            "excerpt": draft.excerpt,
            "featuredImage": draft.featured_image,
            "category": draft.category,
            "tags": draft.tags,
        }
    })
}

/// Pull the human-readable message out of a CMS error body.
pub(crate) fn error_message(bytes: &[u8]) -> String {
    let parsed: Option<Value> = serde_json::from_slice(bytes).ok();
    parsed
        .as_ref()
        .and_then(|body| {
            body.pointer("/error/message")
                .or_else(|| body.get("message"))
                .and_then(Value::as_str)
        })
        .map(str::to_string)
        .unwrap_or_else(|| String::from_utf8_lossy(bytes).trim().to_string())
}

fn data_array(body: &Value) -> Result<&[Value], RepoError> {
    match body.get("data") {
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(Value::Null) | None => Ok(&[]),
        Some(_) => Err(RepoError::decode("`data` is not a list")),
    }
}

fn flatten_entry(entry: &Value) -> Result<Map<String, Value>, RepoError> {
    let object = entry
        .as_object()
        .ok_or_else(|| RepoError::decode("entry is not an object"))?;

    let Some(Value::Object(attributes)) = object.get("attributes") else {
        return Ok(object.clone());
    };

    let mut fields = attributes.clone();
    for key in ["id", "documentId"] {
        if let Some(value) = object.get(key) {
            fields.insert(key.to_string(), value.clone());
        }
    }
    Ok(fields)
}

fn taxonomy(entry: &Value) -> Result<(u64, String, String), RepoError> {
    let fields = flatten_entry(entry)?;
    let id = required_id(&fields)?;
    let name = required_string(&fields, "name")?;
    let slug = optional_string(&fields, "slug")
        .or_else(|| derive_slug(&name).ok())
        .unwrap_or_default();
    Ok((id, name, slug))
}

/// Media fields are either a URL or a populated upload relation.
fn media_url(value: &Value) -> Option<String> {
    match value {
        Value::String(url) if !url.is_empty() => Some(url.clone()),
        Value::Object(_) => ["/data/attributes/url", "/data/url", "/attributes/url", "/url"]
            .iter()
            .find_map(|pointer| value.pointer(pointer).and_then(Value::as_str))
            .filter(|url| !url.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

fn required_id(fields: &Map<String, Value>) -> Result<u64, RepoError> {
    fields
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| RepoError::decode("entry has no numeric `id`"))
}

fn required_string(fields: &Map<String, Value>, key: &str) -> Result<String, RepoError> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| RepoError::decode(format!("entry has no `{key}`")))
}

fn optional_string(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

fn optional_datetime(
    fields: &Map<String, Value>,
    key: &str,
) -> Result<Option<OffsetDateTime>, RepoError> {
    match fields.get(key).and_then(Value::as_str) {
        Some(raw) => OffsetDateTime::parse(raw, &Rfc3339)
            .map(Some)
            .map_err(|err| RepoError::decode(format!("`{key}` is not RFC 3339: {err}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn nested_and_flat_entries_decode_alike() {
        let nested = json!({
            "id": 7,
            "attributes": {
                "title": "Hello",
                "slug": "hello",
                "content": { "type": "doc", "content": [] },
                "publishedAt": "2024-03-01T09:30:00.000Z",
                "category": { "data": { "id": 2, "attributes": { "name": "Tech", "slug": "tech" } } },
                "tags": { "data": [ { "id": 3, "attributes": { "name": "Rust", "slug": "rust" } } ] }
            }
        });
        let flat = json!({
            "id": 7,
            "documentId": "abc123",
            "title": "Hello",
            "slug": "hello",
            "content": { "type": "doc", "content": [] },
            "publishedAt": "2024-03-01T09:30:00.000Z",
            "category": { "id": 2, "name": "Tech", "slug": "tech" },
            "tags": [ { "id": 3, "name": "Rust", "slug": "rust" } ]
        });

        let a = post(&nested).expect("nested");
        let b = post(&flat).expect("flat");

        assert_eq!(a.id, b.id);
        assert_eq!(a.title, b.title);
        assert_eq!(a.category, b.category);
        assert_eq!(a.tags, b.tags);
        assert_eq!(a.published_at, Some(datetime!(2024-03-01 09:30 UTC)));
        assert_eq!(a.document_id, None);
        assert_eq!(b.document_id.as_deref(), Some("abc123"));
        assert_eq!(b.write_key(), "abc123");
    }

    #[test]
    fn pagination_meta_is_read() {
        let body = json!({
            "data": [ { "id": 1, "title": "A", "slug": "a" } ],
            "meta": { "pagination": { "page": 2, "pageSize": 1, "pageCount": 5, "total": 5 } }
        });
        let page = post_page(&body).expect("page");
        assert_eq!(page.items.len(), 1);
        assert_eq!((page.page, page.page_count, page.total), (2, 5, 5));
    }

    #[test]
    fn missing_relations_decode_to_none() {
        let entry = json!({
            "id": 1, "title": "A", "slug": "a",
            "category": { "data": null },
            "tags": { "data": [] }
        });
        let decoded = post(&entry).expect("post");
        assert_eq!(decoded.category, None);
        assert!(decoded.tags.is_empty());
    }

    #[test]
    fn featured_image_accepts_media_relations() {
        assert_eq!(
            media_url(&json!({ "data": { "attributes": { "url": "/uploads/a.png" } } })).as_deref(),
            Some("/uploads/a.png")
        );
        assert_eq!(
            media_url(&json!({ "url": "/uploads/b.png" })).as_deref(),
            Some("/uploads/b.png")
        );
        assert_eq!(media_url(&json!({ "data": null })), None);
    }

    #[test]
    fn malformed_entries_are_decode_errors() {
        assert!(matches!(post(&json!("nope")), Err(RepoError::Decode(_))));
        assert!(matches!(
            post(&json!({ "id": 1, "title": "A" })),
            Err(RepoError::Decode(_))
        ));
        assert!(matches!(
            post(&json!({ "id": 1, "title": "A", "slug": "a", "publishedAt": "yesterday" })),
            Err(RepoError::Decode(_))
        ));
    }

    #[test]
    fn error_message_prefers_cms_error_shape() {
        let body = br#"{"data":null,"error":{"status":400,"name":"ValidationError","message":"slug must be unique"}}"#;
        assert_eq!(error_message(body), "slug must be unique");
        assert_eq!(error_message(b"Bad Gateway\n"), "Bad Gateway");
    }
}
