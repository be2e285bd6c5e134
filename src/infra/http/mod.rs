mod admin;
mod middleware;
mod public;

pub use admin::{AdminState, SessionCookie, build_admin_router};
pub use public::{HttpState, build_public_router};

use axum::{Router, extract::FromRef, middleware as axum_middleware};
use tidings_api_types::TaxonomyResponse;

use crate::domain::relation::Relation;

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct RouterState {
    pub http: HttpState,
    pub admin: AdminState,
}

impl FromRef<RouterState> for HttpState {
    fn from_ref(state: &RouterState) -> Self {
        state.http.clone()
    }
}

impl FromRef<RouterState> for AdminState {
    fn from_ref(state: &RouterState) -> Self {
        state.admin.clone()
    }
}

/// Public and admin routes on one listener, wrapped in request logging.
pub fn build_router(state: RouterState) -> Router {
    build_public_router()
        .merge(build_admin_router())
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

fn taxonomy_response(relation: Relation) -> TaxonomyResponse {
    TaxonomyResponse {
        id: relation.id,
        name: relation.name,
        slug: relation.slug,
    }
}
