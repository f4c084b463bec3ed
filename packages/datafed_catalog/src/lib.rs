//! Federated catalog service: a global, public-read registry of data
//! resource descriptors, each owned by one identity.
//!
//! Reads are unauthenticated: the catalog's directory listing is public by
//! design. Every mutation carries a detached signature that is verified
//! against the owner's key as currently registered in the key directory.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;

use axum::{Router, routing::get};
use datafed_client::DirectoryClient;

use crate::db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub directory: DirectoryClient,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/entries", axum::routing::post(handlers::publish_entry))
        .route(
            "/entries/{data_id}",
            get(handlers::lookup_entry).delete(handlers::retract_entry),
        )
        .route("/search/keyword/{keyword}", get(handlers::search_by_keyword))
        .route("/search/owner/{owner_id}", get(handlers::search_by_owner))
        .with_state(state)
}
