//! Admin routes. Every route except login requires the session cookie set at
//! login; its value is the CMS-issued token and is forwarded on writes.

use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tidings_api_types::{AdminUserResponse, LoginRequest, PostWriteRequest, PostWriteResponse};

use crate::{
    application::{
        editor::EditorService,
        error::HttpError,
        session::{SessionError, SessionService},
    },
    config::SessionSettings,
    domain::entities::{AdminUser, Post},
};

use super::RouterState;

#[derive(Clone)]
pub struct AdminState {
    pub session: Arc<SessionService>,
    pub editor: Arc<EditorService>,
    pub cookie: SessionCookie,
}

/// Attributes of the cookie that carries the admin session token.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub secure: bool,
    pub max_age: Duration,
}

impl From<&SessionSettings> for SessionCookie {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            name: settings.cookie_name.clone(),
            secure: settings.secure,
            max_age: settings.max_age,
        }
    }
}

impl SessionCookie {
    fn issue(&self, token: String) -> Cookie<'static> {
        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        Cookie::build((self.name.clone(), token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::seconds(max_age))
            .build()
    }

    fn expire(&self) -> Cookie<'static> {
        Cookie::build((self.name.clone(), String::new()))
            .path("/")
            .build()
    }

    fn token<'a>(&self, jar: &'a CookieJar) -> Option<&'a str> {
        jar.get(&self.name).map(|cookie| cookie.value())
    }
}

pub fn build_admin_router() -> Router<RouterState> {
    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/logout", post(logout))
        .route("/admin/me", get(me))
        .route("/admin/posts", post(create_post))
        .route("/admin/posts/{id}", put(update_post).delete(delete_post))
}

async fn login(
    State(state): State<AdminState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, StatusCode), HttpError> {
    let grant = state
        .session
        .login(&request.identifier, &request.password)
        .await?;
    let jar = jar.add(state.cookie.issue(grant.jwt));
    Ok((jar, StatusCode::NO_CONTENT))
}

async fn logout(State(state): State<AdminState>, jar: CookieJar) -> impl IntoResponse {
    (jar.remove(state.cookie.expire()), StatusCode::NO_CONTENT)
}

async fn me(
    State(state): State<AdminState>,
    jar: CookieJar,
) -> Result<Json<AdminUserResponse>, HttpError> {
    let (_, user) = require_session(&state, &jar).await?;
    Ok(Json(AdminUserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
    }))
}

async fn create_post(
    State(state): State<AdminState>,
    jar: CookieJar,
    Json(request): Json<PostWriteRequest>,
) -> Result<Response, HttpError> {
    let (token, _) = require_session(&state, &jar).await?;
    let post = state.editor.create(&token, request).await?;
    Ok((StatusCode::CREATED, Json(write_response(post))).into_response())
}

async fn update_post(
    State(state): State<AdminState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Json(request): Json<PostWriteRequest>,
) -> Result<Json<PostWriteResponse>, HttpError> {
    let (token, _) = require_session(&state, &jar).await?;
    let post = state.editor.update(&token, &id, request).await?;
    Ok(Json(write_response(post)))
}

async fn delete_post(
    State(state): State<AdminState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpError> {
    let (token, _) = require_session(&state, &jar).await?;
    state.editor.delete(&token, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn require_session(
    state: &AdminState,
    jar: &CookieJar,
) -> Result<(String, AdminUser), SessionError> {
    let token = state.cookie.token(jar);
    let user = state.session.authenticate(token).await?;
    let token = token.unwrap_or_default().trim().to_string();
    Ok((token, user))
}

fn write_response(post: Post) -> PostWriteResponse {
    PostWriteResponse {
        id: post.id,
        key: post.write_key(),
        slug: post.slug,
        featured_image: post.featured_image,
    }
}
