//! Admin sessions backed by the CMS's own authentication.
//!
//! The session token is the JWT the CMS issues at login. It is validated on
//! every admin request against the CMS "who am I" endpoint, so revoking a
//! user in the CMS ends their session here too.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::application::repos::{ContentRepo, RepoError};
use crate::domain::entities::{AdminUser, AuthGrant};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("missing credentials")]
    MissingCredentials,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("session is missing or expired")]
    Unauthenticated,
    #[error(transparent)]
    Repo(RepoError),
}

#[derive(Clone)]
pub struct SessionService {
    content: Arc<dyn ContentRepo>,
}

impl SessionService {
    pub fn new(content: Arc<dyn ContentRepo>) -> Self {
        Self { content }
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthGrant, SessionError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        match self.content.login(identifier, password).await {
            Ok(grant) => {
                info!(
                    target = "tidings::session",
                    user_id = grant.user.id,
                    "admin logged in"
                );
                Ok(grant)
            }
            Err(RepoError::Unauthorized) => {
                warn!(target = "tidings::session", "admin login rejected");
                Err(SessionError::InvalidCredentials)
            }
            Err(err) => Err(SessionError::Repo(err)),
        }
    }

    /// Resolve the user behind a session token.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<AdminUser, SessionError> {
        let token = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::Unauthenticated)?;

        match self.content.current_user(token).await {
            Ok(user) => Ok(user),
            Err(RepoError::Unauthorized) => Err(SessionError::Unauthenticated),
            Err(err) => Err(SessionError::Repo(err)),
        }
    }
}
