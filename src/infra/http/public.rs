use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tidings_api_types::{
    PostCardResponse, PostDetailResponse, PostListResponse, TaxonomyResponse,
};

use crate::application::{
    blog::{BlogService, PostCard, PostDetail},
    error::HttpError,
    repos::PostFilter,
    syndication::SyndicationService,
};

use super::{RouterState, taxonomy_response};

#[derive(Clone)]
pub struct HttpState {
    pub blog: Arc<BlogService>,
    pub syndication: Arc<SyndicationService>,
}

pub fn build_public_router() -> Router<RouterState> {
    Router::new()
        .route("/api/posts", get(list_posts))
        .route("/api/posts/{slug}", get(post_detail))
        .route("/api/categories", get(list_categories))
        .route("/api/tags", get(list_tags))
        .route("/rss.xml", get(rss_feed))
        .route("/health", get(health))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PostsQuery {
    page: Option<u32>,
    category: Option<String>,
    tag: Option<String>,
}

async fn list_posts(
    State(state): State<HttpState>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<PostListResponse>, HttpError> {
    let filter = PostFilter {
        category: query.category.filter(|slug| !slug.is_empty()),
        tag: query.tag.filter(|slug| !slug.is_empty()),
    };
    let page = state
        .blog
        .list(filter, query.page.unwrap_or(1))
        .await?;

    Ok(Json(PostListResponse {
        page: page.page,
        page_count: page.page_count,
        total: page.total,
        items: page.items.into_iter().map(card_response).collect(),
    }))
}

async fn post_detail(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<Json<PostDetailResponse>, HttpError> {
    let detail = state.blog.detail(&slug).await?;
    Ok(Json(detail_response(detail)))
}

async fn list_categories(
    State(state): State<HttpState>,
) -> Result<Json<Vec<TaxonomyResponse>>, HttpError> {
    let categories = state.blog.categories().await?;
    Ok(Json(
        categories
            .into_iter()
            .map(|category| TaxonomyResponse {
                id: Some(category.id),
                name: category.name,
                slug: Some(category.slug),
            })
            .collect(),
    ))
}

async fn list_tags(
    State(state): State<HttpState>,
) -> Result<Json<Vec<TaxonomyResponse>>, HttpError> {
    let tags = state.blog.tags().await?;
    Ok(Json(
        tags.into_iter()
            .map(|tag| TaxonomyResponse {
                id: Some(tag.id),
                name: tag.name,
                slug: Some(tag.slug),
            })
            .collect(),
    ))
}

async fn rss_feed(State(state): State<HttpState>) -> Response {
    match state.syndication.rss_feed().await {
        Ok(body) => xml_response(body, "application/rss+xml; charset=utf-8"),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn card_response(card: PostCard) -> PostCardResponse {
    PostCardResponse {
        id: card.id,
        key: card.key,
        slug: card.slug,
        title: card.title,
        excerpt: card.excerpt,
        thumbnail: card.thumbnail,
        category: card.category.map(taxonomy_response),
        tags: card.tags.into_iter().map(taxonomy_response).collect(),
        published_at: card.published_at,
    }
}

fn detail_response(detail: PostDetail) -> PostDetailResponse {
    PostDetailResponse {
        id: detail.id,
        key: detail.key,
        slug: detail.slug,
        title: detail.title,
        html: detail.html,
        meta_description: detail.meta_description,
        featured_image: detail.featured_image,
        category: detail.category.map(taxonomy_response),
        tags: detail.tags.into_iter().map(taxonomy_response).collect(),
        published_at: detail.published_at,
        updated_at: detail.updated_at,
    }
}

fn xml_response(body: String, content_type: &str) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
