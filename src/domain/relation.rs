//! Category and tag references as attached to posts by the CMS.
//!
//! The CMS has returned relations in several shapes across versions and
//! population settings:
//!
//! 1. `{ data: { id, attributes: { name, slug } } }`
//! 2. `{ data: { id, name, slug } }`
//! 3. `{ attributes: { name, slug } }`
//! 4. `{ name, slug }` or a bare string identifier
//!
//! [`resolve_relation_name`] and [`resolve_relation_slug`] probe those shapes
//! in that order. [`Relation::decode`] runs the probe once so the rest of the
//! crate works with a single typed value.

use serde::Serialize;
use serde_json::{Map, Value};

/// A resolved category or tag reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub id: Option<u64>,
    pub name: String,
    pub slug: Option<String>,
}

impl Relation {
    /// Decode a single relation. Returns `None` when no shape yields a name.
    pub fn decode(value: &Value) -> Option<Self> {
        let name = resolve_relation_name(value)?;
        Some(Self {
            id: resolve_relation_id(value),
            name,
            slug: resolve_relation_slug(value),
        })
    }

    /// Decode a to-many relation (`{ data: [..] }`, a bare array, or a single
    /// relation), dropping entries that resolve to nothing.
    pub fn decode_many(value: &Value) -> Vec<Self> {
        let items = match value {
            Value::Array(items) => items.as_slice(),
            Value::Object(object) => match object.get("data") {
                Some(Value::Array(items)) => items.as_slice(),
                _ => return Self::decode(value).into_iter().collect(),
            },
            _ => return Self::decode(value).into_iter().collect(),
        };

        items.iter().filter_map(Self::decode).collect()
    }
}

/// Resolve the display name of a relation, falling back to its slug.
///
/// As a last resort an object that matched no known shape is serialized
/// whole, so unrecognised category data is still shown rather than dropped.
pub fn resolve_relation_name(value: &Value) -> Option<String> {
    match resolve_field(value, &["name", "slug"]) {
        Lookup::Found(name) => Some(name),
        Lookup::Absent => None,
        Lookup::Unmatched(object) => Some(Value::Object(object.clone()).to_string()),
    }
}

/// Resolve the slug of a relation. No fallback: a missing slug stays missing.
pub fn resolve_relation_slug(value: &Value) -> Option<String> {
    match resolve_field(value, &["slug"]) {
        Lookup::Found(slug) => Some(slug),
        Lookup::Absent | Lookup::Unmatched(_) => None,
    }
}

fn resolve_relation_id(value: &Value) -> Option<u64> {
    let object = value.as_object()?;
    let entity = match object.get("data") {
        Some(Value::Object(data)) => data,
        Some(_) => return None,
        None => object,
    };
    match entity.get("id") {
        Some(Value::Number(id)) => id.as_u64(),
        Some(Value::String(id)) => id.parse().ok(),
        _ => None,
    }
}

enum Lookup<'a> {
    Found(String),
    /// Nothing usable and nothing worth surfacing.
    Absent,
    /// An object was present but matched no known shape.
    Unmatched(&'a Map<String, Value>),
}

fn resolve_field<'a>(value: &'a Value, fields: &[&str]) -> Lookup<'a> {
    if is_falsy(value) {
        return Lookup::Absent;
    }

    let object = match value {
        Value::String(identifier) => return Lookup::Found(identifier.clone()),
        Value::Object(object) => object,
        _ => return Lookup::Absent,
    };

    // Order matters: responses from different CMS versions have been seen
    // carrying more than one of these keys at once.
    let candidates: Vec<&Map<String, Value>> = if let Some(data) = object.get("data") {
        match data {
            Value::Object(entity) => attributes(entity).into_iter().chain([entity]).collect(),
            _ => return Lookup::Absent,
        }
    } else if let Some(attributes) = object.get("attributes") {
        match attributes {
            Value::Object(attributes) => vec![attributes],
            _ => Vec::new(),
        }
    } else {
        vec![object]
    };

    for field in fields {
        for candidate in &candidates {
            if let Some(found) = string_field(candidate, field) {
                return Lookup::Found(found);
            }
        }
    }

    if object.is_empty() {
        Lookup::Absent
    } else {
        Lookup::Unmatched(object)
    }
}

fn attributes(entity: &Map<String, Value>) -> Option<&Map<String, Value>> {
    entity.get("attributes").and_then(Value::as_object)
}

fn string_field(object: &Map<String, Value>, field: &str) -> Option<String> {
    object
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().is_none_or(|n| n == 0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
