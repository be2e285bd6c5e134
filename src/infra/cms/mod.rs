//! REST client for the headless CMS that stores posts and admin accounts.

mod decode;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::{
    application::repos::{ContentRepo, Page, PageRequest, PostFilter, RepoError},
    config::CmsSettings,
    domain::entities::{AdminUser, AuthGrant, Category, Post, PostDraft, Tag},
    infra::error::InfraError,
};

const TAXONOMY_PAGE_SIZE: &str = "100";

#[derive(Clone, Debug)]
pub struct CmsClient {
    client: Client,
    base: Url,
    api_token: Option<String>,
}

/// Which credential a request carries.
enum Auth<'a> {
    /// The configured read token, when there is one.
    Public,
    /// A user session token.
    User(&'a str),
    Anonymous,
}

impl CmsClient {
    pub fn new(settings: &CmsSettings) -> Result<Self, InfraError> {
        let base = settings
            .base_url
            .clone()
            .ok_or_else(|| InfraError::configuration("cms.base_url is required to serve"))?;
        Self::with_base(base, settings.api_token.clone(), settings.timeout)
    }

    pub fn with_base(
        mut base: Url,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, InfraError> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(|err| InfraError::cms(format!("failed to build http client: {err}")))?;

        Ok(Self {
            client,
            base,
            api_token,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("tidings/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, RepoError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|err| RepoError::Transport(format!("invalid CMS path `{path}`: {err}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        auth: Auth<'_>,
    ) -> Result<RequestBuilder, RepoError> {
        let url = self.url(path, query)?;
        let request = self.client.request(method, url);
        let token = match auth {
            Auth::Public => self.api_token.as_deref(),
            Auth::User(token) => Some(token),
            Auth::Anonymous => None,
        };
        Ok(match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    /// Send a request and return the decoded JSON body (`Null` when empty).
    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Value, RepoError> {
        let started = Instant::now();
        let result = Self::execute(request).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let outcome = if result.is_ok() { "ok" } else { "error" };
        counter!("tidings_cms_requests_total", "operation" => operation, "outcome" => outcome)
            .increment(1);
        histogram!("tidings_cms_request_ms", "operation" => operation).record(elapsed_ms);

        match &result {
            Ok(_) => debug!(
                target = "tidings::infra::cms",
                operation,
                elapsed_ms,
                "cms request completed"
            ),
            Err(err) => warn!(
                target = "tidings::infra::cms",
                operation,
                elapsed_ms,
                error = %err,
                "cms request failed"
            ),
        }

        result
    }

    async fn execute(request: RequestBuilder) -> Result<Value, RepoError> {
        let response = request
            .send()
            .await
            .map_err(|err| RepoError::Transport(err.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| RepoError::Transport(err.to_string()))?;

        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RepoError::Unauthorized,
                StatusCode::NOT_FOUND => RepoError::NotFound,
                _ => RepoError::upstream(status.as_u16(), decode::error_message(&bytes)),
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|err| RepoError::decode(format!("failed to parse body: {err}")))
    }
}

fn list_query(filter: &PostFilter, page: PageRequest) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("populate", "*".to_string()),
        ("sort", "publishedAt:desc".to_string()),
        ("pagination[page]", page.page.to_string()),
        ("pagination[pageSize]", page.page_size.to_string()),
    ];
    if let Some(category) = filter.category.as_ref() {
        query.push(("filters[category][slug][$eq]", category.clone()));
    }
    if let Some(tag) = filter.tag.as_ref() {
        query.push(("filters[tags][slug][$eq]", tag.clone()));
    }
    query
}

fn taxonomy_query() -> Vec<(&'static str, String)> {
    vec![
        ("sort", "name:asc".to_string()),
        ("pagination[pageSize]", TAXONOMY_PAGE_SIZE.to_string()),
    ]
}

#[async_trait]
impl ContentRepo for CmsClient {
    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let request = self.request(
            Method::GET,
            "api/posts",
            &list_query(filter, page),
            Auth::Public,
        )?;
        let body = self.send("list_posts", request).await?;
        decode::post_page(&body)
    }

    async fn find_post(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let query = [
            ("populate", "*".to_string()),
            ("filters[slug][$eq]", slug.to_string()),
            ("pagination[pageSize]", "1".to_string()),
        ];
        let request = self.request(Method::GET, "api/posts", &query, Auth::Public)?;
        let body = self.send("find_post", request).await?;
        decode::first_post(&body)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        let request = self.request(
            Method::GET,
            "api/categories",
            &taxonomy_query(),
            Auth::Public,
        )?;
        let body = self.send("list_categories", request).await?;
        decode::categories(&body)
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, RepoError> {
        let request = self.request(Method::GET, "api/tags", &taxonomy_query(), Auth::Public)?;
        let body = self.send("list_tags", request).await?;
        decode::tags(&body)
    }

    async fn create_post(&self, token: &str, draft: &PostDraft) -> Result<Post, RepoError> {
        let request = self
            .request(Method::POST, "api/posts", &[], Auth::User(token))?
            .json(&decode::draft_body(draft));
        let body = self.send("create_post", request).await?;
        decode::single_post(&body)
    }

    async fn update_post(
        &self,
        token: &str,
        key: &str,
        draft: &PostDraft,
    ) -> Result<Post, RepoError> {
        let path = format!("api/posts/{key}");
        let request = self
            .request(Method::PUT, &path, &[], Auth::User(token))?
            .json(&decode::draft_body(draft));
        let body = self.send("update_post", request).await?;
        decode::single_post(&body)
    }

    async fn delete_post(&self, token: &str, key: &str) -> Result<(), RepoError> {
        let path = format!("api/posts/{key}");
        let request = self.request(Method::DELETE, &path, &[], Auth::User(token))?;
        self.send("delete_post", request).await?;
        Ok(())
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<AuthGrant, RepoError> {
        let request = self
            .request(Method::POST, "api/auth/local", &[], Auth::Anonymous)?
            .json(&json!({ "identifier": identifier, "password": password }));
        match self.send("login", request).await {
            Ok(body) => decode::auth_grant(&body),
            // Bad credentials come back as a validation failure.
            Err(RepoError::Upstream { status: 400, .. }) => Err(RepoError::Unauthorized),
            Err(err) => Err(err),
        }
    }

    async fn current_user(&self, token: &str) -> Result<AdminUser, RepoError> {
        let request = self.request(Method::GET, "api/users/me", &[], Auth::User(token))?;
        let body = self.send("current_user", request).await?;
        decode::user(&body)
    }
}
