//! Tidings: a blog server that reads posts from a headless CMS and renders
//! their rich-text bodies into HTML, plain-text excerpts and thumbnails.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
