//! Local catalog + access-control service.
//!
//! Unlike the federated catalog, *everything* here is gated on the
//! resource's administrator: reads of resource metadata, reads of the grant
//! table, and every mutation. Grants are time-bound capabilities issued by
//! the administrator to other identities; deleting a resource cascades over
//! its grants atomically.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;

use axum::{Router, routing::post};
use datafed_client::DirectoryClient;

use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub directory: DirectoryClient,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/resources", post(handlers::publish_resource))
        .route("/resources/{data_id}/read", post(handlers::read_resource))
        .route("/resources/{data_id}/revoke", post(handlers::revoke_resource))
        .route("/resources/{data_id}/grants/read", post(handlers::read_grants))
        .route("/grants", post(handlers::grant_access))
        .route(
            "/grants/{data_id}/{grantee_id}/revoke",
            post(handlers::revoke_grant),
        )
        .with_state(state)
}
