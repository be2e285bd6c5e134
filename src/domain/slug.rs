//! URL slug derivation for posts written in the admin editor.
//!
//! Slugs go through the `slug` crate, which transliterates non-ASCII titles
//! (including Hangul) before lowercasing and hyphenating.

use slug::slugify;
use thiserror::Error;

const MAX_SLUG_CHARS: usize = 96;

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Derive a slug from human-readable text such as a post title.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(input);
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(shorten(candidate))
}

/// Use an author-supplied slug when present, otherwise derive one from `title`.
pub fn slug_or_derive(explicit: Option<&str>, title: &str) -> Result<String, SlugError> {
    match explicit.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => derive_slug(value),
        None => derive_slug(title),
    }
}

fn shorten(slug: String) -> String {
    if slug.chars().count() <= MAX_SLUG_CHARS {
        return slug;
    }
    let truncated: String = slug.chars().take(MAX_SLUG_CHARS).collect();
    truncated.trim_end_matches('-').to_string()
}
