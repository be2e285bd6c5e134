use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tidings_api_types::ErrorResponse;

use crate::{
    application::{
        blog::BlogError, editor::EditorError, repos::RepoError, session::SessionError,
        syndication::SyndicationError,
    },
    infra::error::InfraError,
};

/// Diagnostic detail attached to error responses and consumed by the
/// response-logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.public_message.to_string(),
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}

/// Map a repository error to a consistent HTTP error response.
pub fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    match err {
        RepoError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "Resource not found",
            "resource not found",
        ),
        RepoError::Unauthorized => HttpError::new(
            source,
            StatusCode::UNAUTHORIZED,
            "Authentication required",
            "content backend rejected the credentials",
        ),
        RepoError::Upstream { status, .. } if status == 400 => HttpError::from_error(
            source,
            StatusCode::BAD_REQUEST,
            "Request rejected by content backend",
            &err,
        ),
        RepoError::Upstream { .. } | RepoError::Transport(_) | RepoError::Decode(_) => {
            HttpError::from_error(
                source,
                StatusCode::BAD_GATEWAY,
                "Content backend unavailable",
                &err,
            )
        }
    }
}

impl From<BlogError> for HttpError {
    fn from(error: BlogError) -> Self {
        match error {
            BlogError::NotFound(slug) => HttpError::new(
                "application::blog",
                StatusCode::NOT_FOUND,
                "Post not found",
                format!("no post with slug `{slug}`"),
            ),
            BlogError::Repo(err) => repo_error_to_http("application::blog", err),
        }
    }
}

impl From<SyndicationError> for HttpError {
    fn from(error: SyndicationError) -> Self {
        match error {
            SyndicationError::Posts(err) => repo_error_to_http("application::syndication", err),
        }
    }
}

impl From<EditorError> for HttpError {
    fn from(error: EditorError) -> Self {
        match error {
            EditorError::Validation(err) => HttpError::from_error(
                "application::editor",
                StatusCode::UNPROCESSABLE_ENTITY,
                "Post could not be saved",
                &err,
            ),
            EditorError::Repo(err) => repo_error_to_http("application::editor", err),
        }
    }
}

impl From<SessionError> for HttpError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::MissingCredentials => HttpError::new(
                "application::session",
                StatusCode::BAD_REQUEST,
                "Identifier and password are required",
                "missing credentials",
            ),
            SessionError::InvalidCredentials => HttpError::new(
                "application::session",
                StatusCode::UNAUTHORIZED,
                "Invalid credentials",
                "login rejected by content backend",
            ),
            SessionError::Unauthenticated => HttpError::new(
                "application::session",
                StatusCode::UNAUTHORIZED,
                "Authentication required",
                "session missing or expired",
            ),
            SessionError::Repo(err) => repo_error_to_http("application::session", err),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
